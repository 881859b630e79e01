//! Read-side listings against the in-memory adapters.

use super::helpers::{MemoryContext, commit_task, context, register_user, task_created_at};
use rstest::rstest;
use taskmate::task::{
    domain::TaskState,
    ports::{TaskRepository, TaskRepositoryError},
    services::CreateTaskRequest,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn find_by_state_lists_newest_first(context: MemoryContext) {
    let alice = register_user(context.repository.users(), "alice")
        .await
        .expect("alice");
    let oldest = task_created_at("Oldest", 0).expect("task");
    let middle = task_created_at("Middle", 10).expect("task");
    let newest = task_created_at("Newest", 20).expect("task");
    for task in [middle.clone(), newest.clone(), oldest.clone()] {
        commit_task(&context.repository, task, alice)
            .await
            .expect("commit");
    }

    let todo = context
        .queries
        .find_by_state(TaskState::Todo)
        .await
        .expect("lookup");

    assert_eq!(todo, vec![newest, middle, oldest]);
    assert!(
        context
            .queries
            .find_by_state(TaskState::Done)
            .await
            .expect("lookup")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn per_user_listings_distinguish_roles(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");
    let carol = register_user(users, "carol").await.expect("carol");

    let by_alice = context
        .service
        .call(
            CreateTaskRequest::new("Alice's errand")
                .with_creator(alice)
                .with_assignees([bob]),
        )
        .await
        .expect("create")
        .into_task();
    let by_bob = context
        .service
        .call(
            CreateTaskRequest::new("Bob's errand")
                .with_creator(bob)
                .with_assignees([carol]),
        )
        .await
        .expect("create")
        .into_task();

    assert_eq!(
        context.queries.created_by(alice).await.expect("lookup"),
        vec![by_alice.clone()]
    );
    assert!(context.queries.assigned_to(alice).await.expect("lookup").is_empty());
    assert_eq!(
        context.queries.assigned_to(bob).await.expect("lookup"),
        vec![by_alice.clone()]
    );
    assert_eq!(
        context.queries.created_by(bob).await.expect("lookup"),
        vec![by_bob.clone()]
    );

    let mut linked_to_bob = context.queries.linked_to(bob).await.expect("lookup");
    linked_to_bob.sort_by_key(|task| task.title().to_owned());
    assert_eq!(linked_to_bob, vec![by_alice, by_bob]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_removes_it_from_every_listing(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");
    let task_id = context
        .service
        .call(
            CreateTaskRequest::new("Short lived")
                .with_creator(alice)
                .with_assignees([bob]),
        )
        .await
        .expect("create")
        .task()
        .id();

    context.repository.delete(task_id).await.expect("delete");

    assert_eq!(context.queries.find_by_id(task_id).await.expect("lookup"), None);
    assert!(context.queries.memberships(task_id).await.expect("lookup").is_empty());
    assert!(context.queries.linked_to(alice).await.expect("lookup").is_empty());
    assert!(context.queries.assigned_to(bob).await.expect("lookup").is_empty());
    assert!(matches!(
        context.repository.delete(task_id).await,
        Err(TaskRepositoryError::NotFound(id)) if id == task_id
    ));
}
