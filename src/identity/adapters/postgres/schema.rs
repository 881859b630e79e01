//! Diesel schema for user persistence.

diesel::table! {
    /// Registered users.
    users (id) {
        /// Internal user identifier.
        id -> Uuid,
        /// Lower-cased email address.
        #[max_length = 255]
        email -> Varchar,
        /// Public handle.
        #[max_length = 255]
        handle -> Varchar,
        /// Opaque credential digest.
        credential_digest -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
