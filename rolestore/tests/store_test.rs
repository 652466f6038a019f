//! Behavior tests for the role store over the in-memory backend.

use std::collections::BTreeSet;

use rolestore::{helpers, GroupName, RoleError, RoleName, RoleStore};
use uuid::Uuid;

fn role(name: &str) -> RoleName {
    RoleName::new(name).expect("valid role name")
}

fn group(name: &str) -> GroupName {
    GroupName::new(name).expect("valid group name")
}

fn names(roles: &BTreeSet<RoleName>) -> Vec<&str> {
    roles.iter().map(RoleName::as_str).collect()
}

#[tokio::test]
async fn added_role_is_queryable() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("g1");

    store
        .add_user_to_roles(user, &[role("admin")], Some(&g))
        .await
        .expect("add should succeed");

    assert!(store
        .user_is_in_role(user, &[role("admin")], Some(&g))
        .await
        .expect("check should succeed"));

    let held = store
        .get_roles_for_user(user, Some(&g))
        .await
        .expect("query should succeed");
    assert!(held.contains(&role("admin")));
}

#[tokio::test]
async fn adding_twice_is_idempotent() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("editor")], None)
        .await
        .expect("first add");
    store
        .add_user_to_roles(user, &[role("editor")], None)
        .await
        .expect("second add");

    let held = store
        .get_roles_for_user(user, None)
        .await
        .expect("query should succeed");
    assert_eq!(names(&held), ["editor"]);
}

#[tokio::test]
async fn set_replaces_entire_role_set() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("team");

    store
        .add_user_to_roles(user, &[role("admin"), role("editor")], Some(&g))
        .await
        .expect("seed roles");

    store
        .set_user_roles(user, &[role("viewer"), role("editor")], Some(&g))
        .await
        .expect("set should succeed");

    let held = store
        .get_roles_for_user(user, Some(&g))
        .await
        .expect("query should succeed");
    assert_eq!(names(&held), ["editor", "viewer"]);
    assert!(!store
        .user_is_in_role(user, &[role("admin")], Some(&g))
        .await
        .expect("check should succeed"));
}

#[tokio::test]
async fn set_with_empty_list_clears_roles() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("admin")], None)
        .await
        .expect("seed role");
    store
        .set_user_roles(user, &[], None)
        .await
        .expect("clear should succeed");

    let held = store
        .get_roles_for_user(user, None)
        .await
        .expect("query should succeed");
    assert!(held.is_empty());
}

#[tokio::test]
async fn removing_unheld_role_is_a_noop() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("editor")], None)
        .await
        .expect("seed role");

    store
        .remove_users_from_roles(&[user], &[role("admin")], None)
        .await
        .expect("remove of unheld role should succeed");

    let held = store
        .get_roles_for_user(user, None)
        .await
        .expect("query should succeed");
    assert_eq!(names(&held), ["editor"]);
}

#[tokio::test]
async fn remove_applies_to_each_listed_user() {
    let store = RoleStore::in_memory();
    let alice = Uuid::now_v7();
    let bob = Uuid::now_v7();
    let carol = Uuid::now_v7();

    for user in [alice, bob, carol] {
        store
            .add_user_to_roles(user, &[role("editor"), role("viewer")], None)
            .await
            .expect("seed roles");
    }

    store
        .remove_users_from_roles(&[alice, bob], &[role("editor")], None)
        .await
        .expect("remove should succeed");

    for user in [alice, bob] {
        assert!(!store
            .user_is_in_role(user, &[role("editor")], None)
            .await
            .expect("check should succeed"));
    }
    assert!(store
        .user_is_in_role(carol, &[role("editor")], None)
        .await
        .expect("check should succeed"));
}

#[tokio::test]
async fn groups_are_isolated_from_each_other_and_from_ungrouped() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g1 = group("g1");
    let g2 = group("g2");

    store
        .add_user_to_roles(user, &[role("admin")], Some(&g1))
        .await
        .expect("add should succeed");

    assert!(store
        .user_is_in_role(user, &[role("admin")], Some(&g1))
        .await
        .expect("check g1"));
    assert!(!store
        .user_is_in_role(user, &[role("admin")], Some(&g2))
        .await
        .expect("check g2"));
    assert!(!store
        .user_is_in_role(user, &[role("admin")], None)
        .await
        .expect("check ungrouped"));
}

#[tokio::test]
async fn ungrouped_roles_are_not_visible_in_groups() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("g1");

    store
        .add_user_to_roles(user, &[role("admin")], None)
        .await
        .expect("add should succeed");

    assert!(store
        .user_is_in_role(user, &[role("admin")], None)
        .await
        .expect("check ungrouped"));
    assert!(!store
        .user_is_in_role(user, &[role("admin")], Some(&g))
        .await
        .expect("check grouped"));
}

#[tokio::test]
async fn any_of_semantics_for_multiple_candidates() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("editor")], None)
        .await
        .expect("add should succeed");

    assert!(store
        .user_is_in_role(user, &[role("admin"), role("editor")], None)
        .await
        .expect("check should succeed"));
    assert!(!store
        .user_is_in_role(user, &[role("admin"), role("owner")], None)
        .await
        .expect("check should succeed"));
}

#[tokio::test]
async fn unknown_user_has_zero_roles() {
    let store = RoleStore::in_memory();
    let stranger = Uuid::now_v7();

    assert!(!store
        .user_is_in_role(stranger, &[role("admin")], None)
        .await
        .expect("check should succeed, not error"));

    let held = store
        .get_roles_for_user(stranger, None)
        .await
        .expect("query should succeed, not error");
    assert!(held.is_empty());
}

#[tokio::test]
async fn empty_role_list_is_rejected_before_mutation() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    let err = store
        .add_user_to_roles(user, &[], None)
        .await
        .expect_err("empty role list must fail");
    assert!(matches!(err, RoleError::InvalidArgument(_)));

    let err = store
        .remove_users_from_roles(&[user], &[], None)
        .await
        .expect_err("empty role list must fail");
    assert!(matches!(err, RoleError::InvalidArgument(_)));

    let held = store
        .get_roles_for_user(user, None)
        .await
        .expect("query should succeed");
    assert!(held.is_empty());
}

#[tokio::test]
async fn empty_role_name_is_rejected_at_construction() {
    let err = RoleName::new("").expect_err("empty role name must fail");
    assert!(matches!(err, RoleError::InvalidArgument(_)));
}

#[tokio::test]
async fn empty_candidate_list_answers_false() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("admin")], None)
        .await
        .expect("add should succeed");

    assert!(!store
        .user_is_in_role(user, &[], None)
        .await
        .expect("check should succeed"));
}

#[tokio::test]
async fn users_in_role_reflects_writes() {
    let store = RoleStore::in_memory();
    let alice = Uuid::now_v7();
    let bob = Uuid::now_v7();
    let g = group("ops");

    store
        .add_user_to_roles(alice, &[role("admin")], Some(&g))
        .await
        .expect("add alice");
    store
        .add_user_to_roles(bob, &[role("admin")], Some(&g))
        .await
        .expect("add bob");

    let mut expected = vec![alice, bob];
    expected.sort();
    assert_eq!(
        store
            .get_users_in_role(&role("admin"), Some(&g))
            .await
            .expect("listing should succeed"),
        expected
    );

    store
        .remove_users_from_roles(&[alice], &[role("admin")], Some(&g))
        .await
        .expect("remove alice");

    assert_eq!(
        store
            .get_users_in_role(&role("admin"), Some(&g))
            .await
            .expect("listing should succeed"),
        vec![bob]
    );

    // Listing is scope-exact as well.
    assert!(store
        .get_users_in_role(&role("admin"), None)
        .await
        .expect("listing should succeed")
        .is_empty());
}

#[tokio::test]
async fn groups_for_user_lists_named_groups_only() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g1 = group("alpha");
    let g2 = group("beta");

    store
        .add_user_to_roles(user, &[role("admin")], Some(&g1))
        .await
        .expect("add in alpha");
    store
        .add_user_to_roles(user, &[role("viewer")], Some(&g2))
        .await
        .expect("add in beta");
    store
        .add_user_to_roles(user, &[role("admin")], None)
        .await
        .expect("add ungrouped");

    let groups = store
        .get_groups_for_user(user, None)
        .await
        .expect("listing should succeed");
    let group_names: Vec<&str> = groups.iter().map(GroupName::as_str).collect();
    assert_eq!(group_names, ["alpha", "beta"]);

    let admin_groups = store
        .get_groups_for_user(user, Some(&role("admin")))
        .await
        .expect("listing should succeed");
    let admin_names: Vec<&str> = admin_groups.iter().map(GroupName::as_str).collect();
    assert_eq!(admin_names, ["alpha"]);
}

#[tokio::test]
async fn assignment_supports_prefetched_checks() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("g1");

    store
        .add_user_to_roles(user, &[role("editor")], Some(&g))
        .await
        .expect("add should succeed");

    let assignment = store
        .assignment(user, Some(&g))
        .await
        .expect("fetch should succeed");
    assert!(assignment.holds(&role("editor")));
    assert!(assignment.holds_any(&[role("admin"), role("editor")]));
    assert!(!assignment.holds_any(&[role("admin")]));
}

#[tokio::test]
async fn concurrent_adds_do_not_lose_updates() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("ops");
    let count = 32;

    let tasks: Vec<_> = (0..count)
        .map(|i| {
            let store = store.clone();
            let g = g.clone();
            tokio::spawn(async move {
                store
                    .add_user_to_roles(user, &[role(&format!("role-{i}"))], Some(&g))
                    .await
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.expect("task should not panic")
            .expect("add should succeed");
    }

    let held = store
        .get_roles_for_user(user, Some(&g))
        .await
        .expect("query should succeed");
    assert_eq!(held.len(), count);
}

#[tokio::test]
async fn concurrent_adds_and_removes_serialize_per_key() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("stable")], None)
        .await
        .expect("seed role");

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let churn = role(&format!("churn-{i}"));
                store
                    .add_user_to_roles(user, std::slice::from_ref(&churn), None)
                    .await?;
                store
                    .remove_users_from_roles(&[user], &[churn], None)
                    .await
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.expect("task should not panic")
            .expect("ops should succeed");
    }

    let held = store
        .get_roles_for_user(user, None)
        .await
        .expect("query should succeed");
    assert_eq!(names(&held), ["stable"]);
}

// ============================================================================
// Adapter helper behavior
// ============================================================================

#[tokio::test]
async fn is_in_role_accepts_comma_separated_specs() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    store
        .add_user_to_roles(user, &[role("editor")], None)
        .await
        .expect("add should succeed");

    assert!(helpers::is_in_role(&store, Some(user), "admin,editor", None).await);
    assert!(helpers::is_in_role(&store, Some(user), " editor , ", None).await);
    assert!(!helpers::is_in_role(&store, Some(user), "admin,owner", None).await);
}

#[tokio::test]
async fn is_in_role_scopes_by_group() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();
    let g = group("g1");

    store
        .add_user_to_roles(user, &[role("admin")], Some(&g))
        .await
        .expect("add should succeed");

    assert!(helpers::is_in_role(&store, Some(user), "admin", Some("g1")).await);
    assert!(!helpers::is_in_role(&store, Some(user), "admin", Some("g2")).await);
    assert!(!helpers::is_in_role(&store, Some(user), "admin", None).await);
}

#[tokio::test]
async fn is_in_role_answers_false_instead_of_raising() {
    let store = RoleStore::in_memory();
    let user = Uuid::now_v7();

    // Missing (unauthenticated) user.
    assert!(!helpers::is_in_role(&store, None, "admin", None).await);
    // Spec with no role names.
    assert!(!helpers::is_in_role(&store, Some(user), " , ", None).await);
    // Invalid group name.
    assert!(!helpers::is_in_role(&store, Some(user), "admin", Some("$g")).await);
}
