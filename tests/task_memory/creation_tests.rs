//! Atomic task creation against the in-memory adapters.

use std::sync::Arc;

use super::helpers::{
    FaultyTaskRepository, MemoryContext, context, register_user, stored_task_count,
};
use mockable::DefaultClock;
use rstest::rstest;
use taskmate::identity::domain::UserId;
use taskmate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{MembershipRole, TaskState},
    ports::TaskRepository,
    services::{CreateTaskRequest, CreateTaskResponse, TaskCreationError, TaskCreationService},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creator_and_valid_assignees_commit_together(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");
    let carol = register_user(users, "carol").await.expect("carol");

    let created = context
        .service
        .call(
            CreateTaskRequest::new("Buy milk")
                .with_creator(alice)
                .with_assignees([bob, carol]),
        )
        .await
        .expect("task creation should succeed");

    let task_id = created.task().id();
    let stored = context
        .queries
        .find_by_id(task_id)
        .await
        .expect("lookup")
        .expect("task persisted");
    assert_eq!(stored.title(), "Buy milk");
    assert_eq!(stored.state(), TaskState::Todo);

    let memberships = context.queries.memberships(task_id).await.expect("lookup");
    let links: Vec<_> = memberships
        .iter()
        .map(|membership| (membership.user_id(), membership.role()))
        .collect();
    assert_eq!(
        links,
        vec![
            (alice, MembershipRole::Creator),
            (bob, MembershipRole::Assignee),
            (carol, MembershipRole::Assignee),
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_without_assignees_has_only_the_creator_link(context: MemoryContext) {
    let alice = register_user(context.repository.users(), "alice")
        .await
        .expect("alice");

    let created = context
        .service
        .call(CreateTaskRequest::new("Solo errand").with_creator(alice))
        .await
        .expect("task creation should succeed");

    let memberships = context
        .queries
        .memberships(created.task().id())
        .await
        .expect("lookup");
    assert_eq!(memberships.len(), 1);
    assert_eq!(
        memberships
            .iter()
            .filter(|membership| membership.is_creator())
            .count(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_creator_persists_nothing(context: MemoryContext) {
    let bob = register_user(context.repository.users(), "bob")
        .await
        .expect("bob");

    let result = context
        .service
        .call(CreateTaskRequest::new("Buy milk").with_assignees([bob]))
        .await;

    let err = result.expect_err("creator is required");
    assert_eq!(err, TaskCreationError::MissingCreator);
    assert_eq!(err.messages(), vec!["Creator is required".to_owned()]);
    assert_eq!(
        stored_task_count(&*context.repository)
            .await
            .expect("count"),
        0
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_title_persists_nothing(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");

    let result = context
        .service
        .call(
            CreateTaskRequest::new("")
                .with_creator(alice)
                .with_assignees([bob]),
        )
        .await;

    let err = result.expect_err("blank title is rejected");
    assert_eq!(err.messages(), vec!["Title can't be blank".to_owned()]);
    assert_eq!(
        stored_task_count(&*context.repository)
            .await
            .expect("count"),
        0
    );
    assert!(context.queries.linked_to(alice).await.expect("lookup").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_unknown_assignee_rejects_the_whole_request(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");

    let result = context
        .service
        .call(
            CreateTaskRequest::new("Buy milk")
                .with_creator(alice)
                .with_assignees([bob, UserId::new()]),
        )
        .await;

    let err = result.expect_err("unknown assignee is rejected");
    assert_eq!(err, TaskCreationError::UnresolvedAssignees);
    assert_eq!(
        err.messages(),
        vec!["Some assignees could not be found".to_owned()]
    );
    assert_eq!(
        stored_task_count(&*context.repository)
            .await
            .expect("count"),
        0
    );
    assert!(context.queries.linked_to(bob).await.expect("lookup").is_empty());
}

#[rstest]
#[case::first_assignee(0)]
#[case::second_assignee(1)]
#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_mid_transaction_rolls_everything_back(#[case] fail_on_assignee: usize) {
    let inner = InMemoryTaskRepository::new();
    let users = inner.users().clone();
    let alice = register_user(&users, "alice").await.expect("alice");
    let bob = register_user(&users, "bob").await.expect("bob");
    let carol = register_user(&users, "carol").await.expect("carol");
    let repository = Arc::new(FaultyTaskRepository::new(inner, fail_on_assignee));
    let service = TaskCreationService::new(Arc::clone(&repository), Arc::new(DefaultClock));

    let result = service
        .call(
            CreateTaskRequest::new("Buy milk")
                .with_creator(alice)
                .with_assignees([bob, carol]),
        )
        .await;

    let err = result.expect_err("injected failure surfaces");
    assert_eq!(err.code(), "unexpected");
    assert_eq!(err.messages().len(), 1);
    assert_eq!(
        stored_task_count(repository.inner()).await.expect("count"),
        0
    );
    for user in [alice, bob, carol] {
        assert!(
            repository
                .tasks_for_user(user, None)
                .await
                .expect("lookup")
                .is_empty()
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creator_listed_as_assignee_rolls_back(context: MemoryContext) {
    let alice = register_user(context.repository.users(), "alice")
        .await
        .expect("alice");

    let result = context
        .service
        .call(
            CreateTaskRequest::new("Self assigned")
                .with_creator(alice)
                .with_assignees([alice]),
        )
        .await;

    let err = result.expect_err("duplicate membership is rejected");
    assert_eq!(err.code(), "unexpected");
    assert_eq!(err.messages().len(), 1);
    assert_eq!(
        stored_task_count(&*context.repository)
            .await
            .expect("count"),
        0
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_and_blank_assignee_entries_are_normalised(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");

    let created = context
        .service
        .call(
            CreateTaskRequest::new("Tidy up")
                .with_creator(alice)
                .with_assignee_ids([
                    String::new(),
                    format!(" {bob} "),
                    bob.to_string(),
                    "   ".to_owned(),
                ]),
        )
        .await
        .expect("task creation should succeed");

    assert_eq!(created.assignee_ids(), vec![bob]);
    assert_eq!(created.memberships().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creations_each_get_exactly_one_creator(context: MemoryContext) {
    let users = context.repository.users();
    let alice = register_user(users, "alice").await.expect("alice");
    let bob = register_user(users, "bob").await.expect("bob");

    let first = context.service.call(
        CreateTaskRequest::new("First")
            .with_creator(alice)
            .with_assignees([bob]),
    );
    let second = context.service.call(
        CreateTaskRequest::new("Second")
            .with_creator(bob)
            .with_assignees([alice]),
    );
    let (first_result, second_result) = tokio::join!(first, second);

    for created in [
        first_result.expect("first creation"),
        second_result.expect("second creation"),
    ] {
        let memberships = context
            .queries
            .memberships(created.task().id())
            .await
            .expect("lookup");
        assert_eq!(
            memberships
                .iter()
                .filter(|membership| membership.is_creator())
                .count(),
            1
        );
        assert_eq!(memberships.len(), 2);
    }
    assert_eq!(context.queries.linked_to(alice).await.expect("lookup").len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn response_envelope_serializes_success_and_error(context: MemoryContext) {
    let alice = register_user(context.repository.users(), "alice")
        .await
        .expect("alice");

    let success = CreateTaskResponse::from(
        context
            .service
            .call(CreateTaskRequest::new("Buy milk").with_creator(alice))
            .await,
    );
    let failure = CreateTaskResponse::from(
        context
            .service
            .call(CreateTaskRequest::new(" ").with_creator(alice))
            .await,
    );

    let success_json = serde_json::to_value(&success).expect("serialize success");
    assert_eq!(success_json["status"], "success");
    assert_eq!(success_json["task"]["title"], "Buy milk");
    assert_eq!(success_json["task"]["state"], "todo");
    assert!(success_json.get("errors").is_none());

    let failure_json = serde_json::to_value(&failure).expect("serialize failure");
    assert_eq!(
        failure_json,
        serde_json::json!({"status": "error", "errors": ["Title can't be blank"]})
    );
    assert_eq!(failure.http_status(), 422);
}
