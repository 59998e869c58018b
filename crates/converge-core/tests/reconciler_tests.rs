//! Tests for the per-resource reconciler

use converge_core::{
    ApiError, ChecksumEngine, Connection, DiffEngine, Error, ReconcileStatus, Reconciler, Source,
    StateStore,
};
use converge_diff::ConfigDiff;
use converge_test_utils::{FakeApi, TestProject};
use serde_json::{Map, Value, json};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

struct FixedChecksum {
    value: &'static str,
    calls: Rc<Cell<usize>>,
}

impl ChecksumEngine for FixedChecksum {
    fn compute(&self, _payload: &Value) -> String {
        self.calls.set(self.calls.get() + 1);
        self.value.to_string()
    }
}

#[derive(Default)]
struct CountingDiff {
    calls: Rc<Cell<usize>>,
}

impl DiffEngine for CountingDiff {
    fn diff(&self, remote: &Value, local: &Value) -> ConfigDiff {
        self.calls.set(self.calls.get() + 1);
        ConfigDiff::compute(remote, local)
    }
}

fn source_local() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "resource_name": "pg",
        "definition_type": "source",
        "definition_id": "def-1",
        "configuration": {"host": "db", "port": 5432},
    }) else {
        unreachable!()
    };
    map
}

fn remote_source(id: &str) -> Value {
    json!({
        "sourceId": id,
        "workspaceId": "ws",
        "sourceDefinitionId": "def-1",
        "name": "pg",
        "connectionConfiguration": {"host": "old-db", "port": 5432},
    })
}

fn configuration_path(project: &TestProject) -> PathBuf {
    project.write_declaration("sources", "pg", "resource_name: pg\n")
}

fn reconciler_with<'a>(
    api: &'a FakeApi,
    path: PathBuf,
    checksum: &'static str,
) -> (Reconciler<'a, Source, FakeApi>, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let checksum_calls = Rc::new(Cell::new(0));
    let diff_calls = Rc::new(Cell::new(0));
    let reconciler = Reconciler::<Source, FakeApi>::with_engines(
        api,
        "ws",
        source_local(),
        path,
        Box::new(FixedChecksum {
            value: checksum,
            calls: checksum_calls.clone(),
        }),
        Box::new(CountingDiff {
            calls: diff_calls.clone(),
        }),
    )
    .unwrap();
    (reconciler, checksum_calls, diff_calls)
}

mod locating {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_match_means_not_created() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();

        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert!(!reconciler.was_created());
        assert_eq!(reconciler.resource_id(), None);
        assert_eq!(reconciler.status(), ReconcileStatus::New);
        assert!(matches!(
            reconciler.get_diff_with_remote_resource(),
            Err(Error::NonExistingResource { .. })
        ));
    }

    #[test]
    fn single_match_binds_resource_id() {
        let project = TestProject::new("ws");
        let api = FakeApi::new().with_record("sources", remote_source("my_resource_id"));

        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert!(reconciler.was_created());
        assert_eq!(reconciler.resource_id(), Some("my_resource_id"));
    }

    #[test]
    fn two_matches_fail_construction() {
        let project = TestProject::new("ws");
        let api = FakeApi::new()
            .with_record("sources", remote_source("a"))
            .with_record("sources", remote_source("b"));

        let result = Reconciler::<Source, FakeApi>::new(
            &api,
            "ws",
            source_local(),
            configuration_path(&project),
        );

        assert!(matches!(
            result,
            Err(Error::DuplicateResource { count: 2, .. })
        ));
    }

    #[test]
    fn search_sends_only_identifying_fields() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();

        reconciler_with(&api, configuration_path(&project), "c");

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sources/search");
        assert_eq!(
            calls[0].1,
            json!({"workspaceId": "ws", "sourceDefinitionId": "def-1", "name": "pg"})
        );
    }

    #[test]
    fn missing_identifying_field_fails_before_searching() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let mut local = source_local();
        local.remove("definition_id");

        let result =
            Reconciler::<Source, FakeApi>::new(&api, "ws", local, configuration_path(&project));

        assert!(matches!(
            result,
            Err(Error::MissingIdentifyingField { field, .. }) if field == "definition_id"
        ));
        assert!(api.calls().is_empty());
    }
}

mod change_detection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_checksum_is_unchanged() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        StateStore::new().save(&path, "src-1", "my_checksum").unwrap();
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));

        let (reconciler, checksum_calls, _) = reconciler_with(&api, path, "my_checksum");

        assert!(!reconciler.local_file_changed());
        assert_eq!(reconciler.status(), ReconcileStatus::Unchanged);
        assert_eq!(checksum_calls.get(), 1);
    }

    #[test]
    fn different_checksum_is_changed() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        StateStore::new().save(&path, "src-1", "my_checksum").unwrap();
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));

        let (reconciler, _, _) = reconciler_with(&api, path, "my_new_checksum");

        assert!(reconciler.local_file_changed());
        assert_eq!(reconciler.status(), ReconcileStatus::Drifted);
    }

    #[test]
    fn never_applied_counts_as_changed() {
        let project = TestProject::new("ws");
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));

        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert!(reconciler.state().is_none());
        assert!(reconciler.local_file_changed());
        assert_eq!(reconciler.status(), ReconcileStatus::Drifted);
    }

    #[test]
    fn state_without_remote_is_orphaned() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        StateStore::new().save(&path, "src-gone", "c").unwrap();
        let api = FakeApi::new();

        let (reconciler, _, _) = reconciler_with(&api, path, "c");

        assert_eq!(reconciler.status(), ReconcileStatus::OrphanLocalState);
    }
}

mod writes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_persists_returned_id_and_local_checksum() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, path.clone(), "local_checksum");

        let (record, state) = reconciler.create().unwrap();

        assert_eq!(record["sourceId"], "source-1");
        assert_eq!(state.resource_id, "source-1");
        let loaded = StateStore::new().load(&path).unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.configuration_checksum, "local_checksum");
        assert_eq!(api.call_count("sources/create"), 1);
    }

    #[test]
    fn create_sends_declared_configuration() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        reconciler.create().unwrap();

        let (operation, payload) = api.calls().pop().unwrap();
        assert_eq!(operation, "sources/create");
        assert_eq!(
            payload,
            json!({
                "workspaceId": "ws",
                "sourceDefinitionId": "def-1",
                "name": "pg",
                "connectionConfiguration": {"host": "db", "port": 5432},
            })
        );
    }

    #[test]
    fn update_targets_bound_resource() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));
        let (reconciler, _, _) = reconciler_with(&api, path.clone(), "c2");

        let (record, state) = reconciler.update().unwrap();

        assert_eq!(record["connectionConfiguration"]["host"], "db");
        assert_eq!(state.resource_id, "src-1");
        assert_eq!(
            StateStore::new().load(&path).unwrap().unwrap().configuration_checksum,
            "c2"
        );
    }

    #[test]
    fn update_without_remote_is_non_existing() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert!(matches!(
            reconciler.update(),
            Err(Error::NonExistingResource { .. })
        ));
        assert_eq!(api.call_count("sources/update"), 0);
    }

    #[test]
    fn not_found_propagates_unchanged() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, path.clone(), "c");
        let not_found = ApiError::from_status("sources/create", 404, "no such workspace");
        api.fail_next("sources/create", not_found.clone());

        let err = reconciler.create().unwrap_err();

        assert!(matches!(err, Error::Api(ref inner) if *inner == not_found));
        assert!(StateStore::new().load(&path).unwrap().is_none());
    }

    #[test]
    fn unprocessable_becomes_invalid_configuration() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, path.clone(), "c");
        api.fail_next(
            "sources/create",
            ApiError::from_status("sources/create", 422, "port must be a string"),
        );

        let err = reconciler.create().unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidConfiguration { ref detail, .. } if detail == "port must be a string"
        ));
        assert!(StateStore::new().load(&path).unwrap().is_none());
    }

    #[test]
    fn create_or_update_accepts_any_operation() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, path, "c");

        let (_, state) = reconciler
            .create_or_update(
                |_api, _payload| Ok(json!({"sourceId": "from-closure"})),
                &json!({}),
            )
            .unwrap();

        assert_eq!(state.resource_id, "from-closure");
    }

    #[test]
    fn response_without_id_is_malformed() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        let err = reconciler
            .create_or_update(|_api, _payload| Ok(json!({"name": "pg"})), &json!({}))
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}

mod diffing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn diff_renders_engine_output_once_without_side_effects() {
        let project = TestProject::new("ws");
        let path = configuration_path(&project);
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));
        let (reconciler, _, diff_calls) = reconciler_with(&api, path.clone(), "c");
        let calls_before = api.calls().len();

        let rendered = reconciler.get_diff_with_remote_resource().unwrap();

        let expected = ConfigDiff::compute(
            &json!({"host": "old-db", "port": 5432}),
            &json!({"host": "db", "port": 5432}),
        )
        .render();
        assert_eq!(rendered, expected);
        assert!(rendered.contains("-host: old-db"), "got: {rendered}");
        assert_eq!(diff_calls.get(), 1);
        assert_eq!(api.calls().len(), calls_before);
        assert!(StateStore::new().load(&path).unwrap().is_none());
    }

    #[test]
    fn connection_diff_compares_settings_only() {
        let project = TestProject::new("ws");
        let path = project.declare_connection("pg_to_wh", "src-1", "dst-1", "status: active\n");
        let api = FakeApi::new().with_record(
            "connections",
            json!({
                "connectionId": "conn-1",
                "sourceId": "src-1",
                "destinationId": "dst-1",
                "name": "pg_to_wh",
                "status": "active",
            }),
        );
        let Value::Object(local) = json!({
            "resource_name": "pg_to_wh",
            "source_id": "src-1",
            "destination_id": "dst-1",
            "configuration": {"status": "active"},
        }) else {
            unreachable!()
        };

        let reconciler = Reconciler::<Connection, FakeApi>::new(&api, "ws", local, path).unwrap();

        assert_eq!(reconciler.resource_id(), Some("conn-1"));
        assert_eq!(reconciler.get_diff_with_remote_resource().unwrap(), "");
    }

    fn connection_local(configuration: Value) -> Map<String, Value> {
        let Value::Object(local) = json!({
            "resource_name": "pg_to_wh",
            "source_id": "src-1",
            "destination_id": "dst-1",
            "configuration": configuration,
        }) else {
            unreachable!()
        };
        local
    }

    #[test]
    fn created_connection_with_extra_keys_has_no_diff() {
        let project = TestProject::new("ws");
        let path = project.declare_connection("pg_to_wh", "src-1", "dst-1", "status: active\n");
        let api = FakeApi::new();
        let configuration = json!({
            "status": "active",
            "resourceRequirements": {"cpu_limit": "1"},
            "sourceId": "ignored",
        });

        Reconciler::<Connection, FakeApi>::new(
            &api,
            "ws",
            connection_local(configuration.clone()),
            path.clone(),
        )
        .unwrap()
        .create()
        .unwrap();
        let reconciler = Reconciler::<Connection, FakeApi>::new(
            &api,
            "ws",
            connection_local(configuration),
            path,
        )
        .unwrap();

        assert_eq!(reconciler.resource_id(), Some("connection-1"));
        assert_eq!(reconciler.get_diff_with_remote_resource().unwrap(), "");
    }

    #[test]
    fn changed_declared_connection_key_shows_in_diff() {
        let project = TestProject::new("ws");
        let path = project.declare_connection("pg_to_wh", "src-1", "dst-1", "status: active\n");
        let api = FakeApi::new();
        Reconciler::<Connection, FakeApi>::new(
            &api,
            "ws",
            connection_local(json!({"resourceRequirements": {"cpu_limit": "1"}})),
            path.clone(),
        )
        .unwrap()
        .create()
        .unwrap();

        let reconciler = Reconciler::<Connection, FakeApi>::new(
            &api,
            "ws",
            connection_local(json!({"resourceRequirements": {"cpu_limit": "2"}})),
            path,
        )
        .unwrap();
        let diff = reconciler.diff_with_remote_resource().unwrap();

        assert_eq!(
            diff.summary(),
            "~ resourceRequirements.cpu_limit: \"1\" -> \"2\""
        );
    }
}

mod attributes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_class_fields_come_before_declaration_keys() {
        let project = TestProject::new("ws");
        let api = FakeApi::new().with_record("sources", remote_source("src-1"));
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert_eq!(reconciler.attribute("workspace_id").unwrap(), json!("ws"));
        assert_eq!(reconciler.attribute("resource_type").unwrap(), json!("source"));
        assert_eq!(reconciler.attribute("resource_id").unwrap(), json!("src-1"));
        assert_eq!(reconciler.attribute("resource_name").unwrap(), json!("pg"));
        assert_eq!(
            reconciler.attribute("configuration").unwrap()["host"],
            json!("db")
        );
    }

    #[test]
    fn unbound_resource_id_is_null() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert_eq!(reconciler.attribute("resource_id").unwrap(), Value::Null);
    }

    #[test]
    fn unknown_attribute_is_an_error() {
        let project = TestProject::new("ws");
        let api = FakeApi::new();
        let (reconciler, _, _) = reconciler_with(&api, configuration_path(&project), "c");

        assert!(matches!(
            reconciler.attribute("nope"),
            Err(Error::AttributeNotFound { name }) if name == "nope"
        ));
    }
}
