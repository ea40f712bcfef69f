//! End-to-end behavior of the engine over the fixture workspace: the seeded
//! trunk, a forked change set, a list update, a forced overwrite, pruning
//! and resync, plus durability through the journal.

use std::collections::BTreeMap;
use std::sync::Arc;

use mvc_journal::JournalConfig;
use mvc_patch::{AtomMessage, AtomMeta, BatchMeta, ObjectPatch, PatchBatch};
use mvc_types::{ChangeSetId, WorkspaceId};
use proptest::prelude::*;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::TryRecvError;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::hooks::BroadcastInvalidator;
use crate::query::DiagnosticQuery;
use crate::report::ApplyOutcome;

const WS: &str = "test_workspace";

fn ws() -> WorkspaceId {
    WS.into()
}

fn cs(id: &str) -> ChangeSetId {
    id.into()
}

fn ops(raw: Value) -> Vec<json_patch::PatchOperation> {
    serde_json::from_value(raw).unwrap()
}

fn add(kind: &str, id: &str, to: &str, doc: Value) -> ObjectPatch {
    ObjectPatch {
        kind: kind.into(),
        id: id.into(),
        from_checksum: "0".into(),
        to_checksum: to.into(),
        patch: ops(json!([{ "op": "replace", "path": "", "value": doc }])),
    }
}

fn modify(kind: &str, id: &str, from: &str, to: &str, raw: Value) -> ObjectPatch {
    ObjectPatch {
        kind: kind.into(),
        id: id.into(),
        from_checksum: from.into(),
        to_checksum: to.into(),
        patch: ops(raw),
    }
}

fn delete(kind: &str, id: &str, from: &str) -> ObjectPatch {
    ObjectPatch {
        kind: kind.into(),
        id: id.into(),
        from_checksum: from.into(),
        to_checksum: "0".into(),
        patch: Vec::new(),
    }
}

fn batch(change_set: &str, from: &str, to: &str, patches: Vec<ObjectPatch>) -> PatchBatch {
    PatchBatch {
        meta: BatchMeta {
            workspace_id: ws(),
            change_set_id: cs(change_set),
            from_index_checksum: from.into(),
            to_index_checksum: to.into(),
        },
        patches,
    }
}

fn mjolnir(
    change_set: &str,
    from: &str,
    to: &str,
    (kind, id, checksum): (&str, &str, &str),
    data: Value,
) -> AtomMessage {
    AtomMessage {
        atom: AtomMeta {
            id: id.into(),
            kind: kind.into(),
            to_checksum: checksum.into(),
            workspace_id: ws(),
            change_set_id: cs(change_set),
            from_index_checksum: from.into(),
            to_index_checksum: to.into(),
        },
        data,
    }
}

fn rename() -> ObjectPatch {
    modify(
        "testRecord",
        "testId1",
        "tr1",
        "tr1-new-name",
        json!([{ "op": "replace", "path": "/name", "value": "record 1 new name" }]),
    )
}

fn seed_batch() -> PatchBatch {
    batch(
        "HEAD",
        "0",
        "HEAD",
        vec![
            add("testRecord", "testId1", "tr1", json!({ "id": 1, "name": "record 1" })),
            add("testRecord", "testId2", "tr2", json!({ "id": 2, "name": "record 2" })),
            add(
                "testList",
                "changeSetId",
                "tl1",
                json!(["testRecord:testId1:tr1", "testRecord:testId2:tr2"]),
            ),
        ],
    )
}

fn seeded() -> Engine {
    let mut engine = Engine::in_memory().unwrap();
    engine.initialize().unwrap();
    engine.apply_patch_batch(&seed_batch()).unwrap();
    engine
}

fn count_atoms(engine: &Engine) -> u64 {
    engine
        .query(&DiagnosticQuery::CountAtoms { kind: None })
        .unwrap()
        .count()
        .unwrap()
}

fn count_rows(engine: &Engine, index: Option<&str>) -> u64 {
    engine
        .query(&DiagnosticQuery::CountMembership {
            index_checksum: index.map(Into::into),
        })
        .unwrap()
        .count()
        .unwrap()
}

fn membership(engine: &Engine, index: &str) -> BTreeMap<(String, String), String> {
    engine
        .query(&DiagnosticQuery::Membership {
            index_checksum: index.into(),
        })
        .unwrap()
        .rows
        .into_iter()
        .map(|row| {
            let s = |v: &Value| v.as_str().unwrap().to_string();
            ((s(&row[0]), s(&row[1])), s(&row[2]))
        })
        .collect()
}

fn resolves_to(engine: &Engine, change_set: &str) -> Option<String> {
    engine
        .resolve_branch(&ws(), &cs(change_set))
        .unwrap()
        .map(|ix| ix.into_inner())
}

fn scenario_1(engine: &mut Engine) {
    let report = engine
        .apply_patch_batch(&batch("new_change_set", "HEAD", "test_index_checksum_1", vec![rename()]))
        .unwrap();
    assert_eq!(report.outcome, ApplyOutcome::Applied);
}

fn scenario_2(engine: &mut Engine) {
    let report = engine
        .apply_patch_batch(&batch("HEAD", "HEAD", "test_index_checksum_2", vec![rename()]))
        .unwrap();
    assert_eq!(report.atoms_written, 0);
    assert_eq!(report.superseded, Some("HEAD".into()));
}

fn scenario_3(engine: &mut Engine) {
    engine
        .prune_closed_branch(&ws(), &cs("new_change_set"))
        .unwrap();
}

fn scenario_4_batch() -> PatchBatch {
    batch(
        "list_change_set",
        "test_index_checksum_2",
        "test_index_checksum_3",
        vec![
            add("testRecord", "testId3", "tr3-add", json!({ "id": 3, "name": "record 3" })),
            delete("testRecord", "testId1", "tr1-new-name"),
            modify(
                "testList",
                "changeSetId",
                "tl1",
                "tl1-add-remove",
                json!([
                    { "op": "remove", "path": "/0" },
                    { "op": "add", "path": "/-", "value": "testRecord:testId3:tr3-add" }
                ]),
            ),
        ],
    )
}

fn scenario_5_message() -> AtomMessage {
    mjolnir(
        "list_change_set",
        "test_index_checksum_3",
        "test_index_checksum_4",
        ("foobar", "fb1", "fb1"),
        json!({ "foo": "bar" }),
    )
}

fn through_scenario_5(engine: &mut Engine) {
    scenario_1(engine);
    scenario_2(engine);
    scenario_3(engine);
    engine.apply_patch_batch(&scenario_4_batch()).unwrap();
    engine.apply_forced_overwrite(&scenario_5_message()).unwrap();
}

// ---- Fixture scenarios ----

#[test]
fn seed_populates_trunk() {
    let engine = seeded();
    assert_eq!(count_atoms(&engine), 3);
    assert_eq!(count_rows(&engine, Some("HEAD")), 3);
    assert_eq!(resolves_to(&engine, "HEAD").as_deref(), Some("HEAD"));
}

#[test]
fn scenario_1_fork_copies_membership_not_atoms() {
    let mut engine = seeded();
    scenario_1(&mut engine);

    assert_eq!(count_rows(&engine, Some("HEAD")), 3);
    assert_eq!(count_rows(&engine, Some("test_index_checksum_1")), 3);
    assert_eq!(count_atoms(&engine), 4);
    assert_eq!(
        resolves_to(&engine, "new_change_set").as_deref(),
        Some("test_index_checksum_1")
    );

    let head = engine.get(&ws(), &cs("HEAD"), "testRecord", "testId1").unwrap();
    assert_eq!(head, Some(json!({ "id": 1, "name": "record 1" })));
    let forked = engine
        .get(&ws(), &cs("new_change_set"), "testRecord", "testId1")
        .unwrap();
    assert_eq!(forked, Some(json!({ "id": 1, "name": "record 1 new name" })));
}

#[test]
fn scenario_2_trunk_advance_supersedes_old_snapshot() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    scenario_2(&mut engine);

    assert_eq!(count_rows(&engine, Some("HEAD")), 0);
    assert!(!engine
        .query(&DiagnosticQuery::Snapshots)
        .unwrap()
        .column("index_checksum")
        .contains(&&json!("HEAD")));
    assert_eq!(count_rows(&engine, None), 6);
    assert_eq!(count_atoms(&engine), 4);
    assert_eq!(
        resolves_to(&engine, "HEAD").as_deref(),
        Some("test_index_checksum_2")
    );
}

#[test]
fn scenario_3_prune_sweeps_unreachable_rows_and_atoms() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    scenario_2(&mut engine);

    let report = engine
        .prune_closed_branch(&ws(), &cs("new_change_set"))
        .unwrap();
    assert_eq!(report.branches_removed, 1);
    assert_eq!(report.snapshots_dropped, 1);
    assert_eq!(report.atoms_swept, 1);

    let trunk_rows = count_rows(&engine, Some("test_index_checksum_2"));
    assert_eq!(count_rows(&engine, None) - trunk_rows, 0);
    assert_eq!(count_atoms(&engine), 3);
    assert!(resolves_to(&engine, "new_change_set").is_none());

    // The swept atom is the one no live snapshot names.
    let tr1 = engine
        .query(&DiagnosticQuery::Atom {
            kind: "testRecord".into(),
            args: "testId1".into(),
            checksum: "tr1".into(),
        })
        .unwrap();
    assert!(tr1.is_empty());
    let renamed = engine
        .get(&ws(), &cs("HEAD"), "testRecord", "testId1")
        .unwrap();
    assert_eq!(renamed, Some(json!({ "id": 1, "name": "record 1 new name" })));
}

#[test]
fn scenario_4_add_delete_and_list_update() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    scenario_2(&mut engine);
    scenario_3(&mut engine);

    let report = engine.apply_patch_batch(&scenario_4_batch()).unwrap();
    assert_eq!(report.outcome, ApplyOutcome::Applied);
    assert_eq!(report.atoms_written, 2);

    let added = engine
        .get(&ws(), &cs("list_change_set"), "testRecord", "testId3")
        .unwrap();
    assert_eq!(added, Some(json!({ "id": 3, "name": "record 3" })));

    let deleted = engine
        .get(&ws(), &cs("list_change_set"), "testRecord", "testId1")
        .unwrap();
    assert!(deleted.is_none());

    let list = engine
        .get(&ws(), &cs("list_change_set"), "testList", "changeSetId")
        .unwrap()
        .unwrap();
    assert_eq!(list[0], json!("testRecord:testId2:tr2"));
    assert_eq!(list[1], json!("testRecord:testId3:tr3-add"));
    assert_eq!(count_atoms(&engine), 5);

    let resolved = engine
        .get_list(&ws(), &cs("list_change_set"), "testList", "changeSetId")
        .unwrap();
    assert_eq!(
        resolved,
        vec![
            json!({ "id": 2, "name": "record 2" }),
            json!({ "id": 3, "name": "record 3" }),
        ]
    );
}

#[test]
fn scenario_5_forced_overwrite_of_unseen_kind() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    scenario_2(&mut engine);
    scenario_3(&mut engine);
    engine.apply_patch_batch(&scenario_4_batch()).unwrap();
    let before = count_atoms(&engine);

    let report = engine.apply_forced_overwrite(&scenario_5_message()).unwrap();
    assert_eq!(report.atoms_written, 1);

    assert_eq!(count_atoms(&engine), before + 1);
    let atom = engine
        .query(&DiagnosticQuery::Atom {
            kind: "foobar".into(),
            args: "fb1".into(),
            checksum: "fb1".into(),
        })
        .unwrap();
    assert_eq!(atom.len(), 1);
    assert_eq!(
        resolves_to(&engine, "list_change_set").as_deref(),
        Some("test_index_checksum_4")
    );
    assert_eq!(
        engine
            .get(&ws(), &cs("list_change_set"), "foobar", "fb1")
            .unwrap(),
        Some(json!({ "foo": "bar" }))
    );
    // The forced overwrite carried the rest of the branch along.
    assert_eq!(count_rows(&engine, Some("test_index_checksum_4")), 4);
}

#[test]
fn scenario_6_resync_of_branch_without_state() {
    let mut fresh = Engine::in_memory().unwrap();
    fresh.initialize().unwrap();
    let report = fresh.full_resync(&ws(), &cs("empty_list"), true);
    assert!(!report.degraded);
    assert!(!report.resync_required);
    assert!(report.reclaimed.is_noop());

    let mut engine = seeded();
    through_scenario_5(&mut engine);
    let report = engine.full_resync(&ws(), &cs("empty_list"), true);
    assert!(!report.degraded);
    assert_eq!(report.reclaimed.branches_removed, 2);
    assert!(report.resync_required);
    assert_eq!(count_atoms(&engine), 0);
    assert_eq!(count_rows(&engine, None), 0);
}

// ---- Properties ----

#[test]
fn duplicate_batch_is_a_noop() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    let digest = engine.state_digest().unwrap();

    let report = engine
        .apply_patch_batch(&batch("new_change_set", "HEAD", "test_index_checksum_1", vec![rename()]))
        .unwrap();
    assert_eq!(report.outcome, ApplyOutcome::Duplicate);
    assert_eq!(engine.state_digest().unwrap(), digest);
}

#[test]
fn stale_batch_after_branch_moved_on_is_rejected() {
    let mut engine = seeded();
    let first = batch("b", "HEAD", "s1", vec![rename()]);
    engine.apply_patch_batch(&first).unwrap();
    engine.link_change_set(&ws(), &cs("b"), &cs("c")).unwrap();
    engine
        .apply_patch_batch(&batch(
            "b",
            "s1",
            "s2",
            vec![modify(
                "testRecord",
                "testId1",
                "tr1-new-name",
                "tr1-s2",
                json!([{ "op": "replace", "path": "/name", "value": "second" }]),
            )],
        ))
        .unwrap();
    let digest = engine.state_digest().unwrap();

    let err = engine.apply_patch_batch(&first).unwrap_err();
    assert!(matches!(err, EngineError::OutOfOrder { .. }));
    assert!(err.is_desync());
    assert_eq!(resolves_to(&engine, "b").as_deref(), Some("s2"));
    assert_eq!(count_rows(&engine, Some("s2")), 3);
    assert_eq!(engine.state_digest().unwrap(), digest);
}

#[test]
fn forced_overwrite_leaves_other_branches_snapshot_alone() {
    let mut engine = seeded();
    let digest = engine.state_digest().unwrap();
    let hammer = |to: &str| {
        mjolnir(
            "x",
            "HEAD",
            to,
            ("testRecord", "testId1", "tr1-hammer"),
            json!({ "id": 1, "name": "hammered" }),
        )
    };

    let err = engine.apply_forced_overwrite(&hammer("HEAD")).unwrap_err();
    assert!(matches!(err, EngineError::SharedSnapshot { .. }));
    assert!(err.is_desync());
    assert_eq!(engine.state_digest().unwrap(), digest);
    assert_eq!(resolves_to(&engine, "x"), None);

    engine.apply_forced_overwrite(&hammer("x_ix")).unwrap();
    assert_eq!(
        engine.get(&ws(), &cs("HEAD"), "testRecord", "testId1").unwrap(),
        Some(json!({ "id": 1, "name": "record 1" }))
    );
    assert_eq!(
        engine.get(&ws(), &cs("x"), "testRecord", "testId1").unwrap(),
        Some(json!({ "id": 1, "name": "hammered" }))
    );
    assert_eq!(membership(&engine, "HEAD").len(), 3);
}

#[test]
fn divergent_content_for_a_known_version_is_an_integrity_violation() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    let digest = engine.state_digest().unwrap();

    let err = engine
        .apply_patch_batch(&batch(
            "c",
            "HEAD",
            "ix_c",
            vec![modify(
                "testRecord",
                "testId1",
                "tr1",
                "tr1-new-name",
                json!([{ "op": "replace", "path": "/name", "value": "SOMETHING ELSE" }]),
            )],
        ))
        .unwrap_err();
    assert!(err.is_integrity_violation());
    assert!(!err.is_desync());
    assert_eq!(engine.state_digest().unwrap(), digest);
    assert_eq!(
        engine
            .get(&ws(), &cs("new_change_set"), "testRecord", "testId1")
            .unwrap(),
        Some(json!({ "id": 1, "name": "record 1 new name" }))
    );
}

#[test]
fn materialized_target_is_reused_by_another_branch() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    let atoms = count_atoms(&engine);

    let report = engine
        .apply_patch_batch(&batch("replica", "HEAD", "test_index_checksum_1", vec![rename()]))
        .unwrap();
    assert_eq!(report.outcome, ApplyOutcome::Replayed);
    assert_eq!(report.atoms_written, 0);
    assert_eq!(count_atoms(&engine), atoms);
    assert_eq!(count_rows(&engine, None), 6);
    assert_eq!(
        resolves_to(&engine, "replica").as_deref(),
        Some("test_index_checksum_1")
    );
}

#[test]
fn snapshot_equals_parent_plus_overlay() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    scenario_2(&mut engine);
    scenario_3(&mut engine);
    let parent = membership(&engine, "test_index_checksum_2");

    engine.apply_patch_batch(&scenario_4_batch()).unwrap();
    let child = membership(&engine, "test_index_checksum_3");

    let mut expected = parent;
    expected.remove(&("testRecord".into(), "testId1".into()));
    expected.insert(("testRecord".into(), "testId3".into()), "tr3-add".into());
    expected.insert(("testList".into(), "changeSetId".into()), "tl1-add-remove".into());
    assert_eq!(child, expected);
}

#[test]
fn atoms_are_shared_across_branches() {
    let mut engine = seeded();
    for (i, change_set) in ["a", "b", "c"].iter().enumerate() {
        engine
            .apply_patch_batch(&batch(
                change_set,
                "HEAD",
                &format!("ix_{i}"),
                vec![rename()],
            ))
            .unwrap();
    }
    // Three snapshots hold the renamed version; it is stored once.
    assert_eq!(count_atoms(&engine), 4);
    assert_eq!(count_rows(&engine, None), 12);
}

#[test]
fn prune_keeps_everything_a_live_branch_reaches() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    engine
        .apply_patch_batch(&batch(
            "other",
            "test_index_checksum_1",
            "other_ix",
            vec![add("testRecord", "testId5", "tr5", json!({ "id": 5 }))],
        ))
        .unwrap();

    engine
        .prune_closed_branch(&ws(), &cs("new_change_set"))
        .unwrap();

    for change_set in ["HEAD", "other"] {
        let index = resolves_to(&engine, change_set).unwrap();
        for ((kind, args), _) in membership(&engine, &index) {
            assert!(
                engine.get(&ws(), &cs(change_set), &kind, &args).unwrap().is_some(),
                "{change_set}: {kind}:{args} lost"
            );
        }
    }
    // tr1-new-name is still reachable through `other`.
    assert_eq!(count_atoms(&engine), 5);
}

#[test]
fn prune_edge_cases() {
    let mut engine = seeded();
    let err = engine.prune_closed_branch(&ws(), &cs("HEAD")).unwrap_err();
    assert!(matches!(err, EngineError::TrunkBranch(_)));

    let digest = engine.state_digest().unwrap();
    let report = engine.prune_closed_branch(&ws(), &cs("never_seen")).unwrap();
    assert!(report.is_noop());
    assert_eq!(engine.state_digest().unwrap(), digest);
}

#[test]
fn out_of_order_batch_is_rejected_without_side_effects() {
    let mut engine = seeded();
    let digest = engine.state_digest().unwrap();

    let err = engine
        .apply_patch_batch(&batch("HEAD", "somewhere_else", "next", vec![rename()]))
        .unwrap_err();
    assert!(matches!(err, EngineError::OutOfOrder { .. }));
    assert!(err.is_desync());
    assert_eq!(engine.state_digest().unwrap(), digest);
}

#[test]
fn fork_from_unknown_snapshot_is_rejected() {
    let mut engine = seeded();
    let err = engine
        .apply_patch_batch(&batch("fresh", "not_held", "next", vec![rename()]))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownSnapshot { .. }));
    assert!(err.is_desync());
}

#[test]
fn missing_base_fails_the_whole_batch() {
    let mut engine = seeded();
    let digest = engine.state_digest().unwrap();

    let err = engine
        .apply_patch_batch(&batch(
            "new_change_set",
            "HEAD",
            "next",
            vec![
                add("testRecord", "testId4", "tr4", json!({ "id": 4 })),
                modify("testRecord", "testId2", "tr2-unknown", "tr2-next", json!([])),
            ],
        ))
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingBaseAtom { .. }));
    assert!(err.is_desync());
    assert_eq!(engine.state_digest().unwrap(), digest);
}

#[test]
fn relaxed_ordering_allows_jumping_between_snapshots() {
    let config = EngineConfig {
        strict_ordering: false,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine.apply_patch_batch(&seed_batch()).unwrap();

    let report = engine
        .apply_patch_batch(&batch(
            "HEAD",
            "0",
            "restart",
            vec![add("testRecord", "testId9", "tr9", json!({ "id": 9 }))],
        ))
        .unwrap();
    assert_eq!(report.superseded, Some("HEAD".into()));
    assert_eq!(count_rows(&engine, Some("restart")), 1);
}

#[test]
fn forced_overwrite_replaces_differing_bytes() {
    let mut engine = seeded();
    let report = engine
        .apply_forced_overwrite(&mjolnir(
            "HEAD",
            "HEAD",
            "HEAD",
            ("testRecord", "testId1", "tr1"),
            json!({ "id": 1, "name": "authoritative" }),
        ))
        .unwrap();
    assert_eq!(report.atoms_written, 1);
    assert_eq!(count_atoms(&engine), 3);
    assert_eq!(
        engine.get(&ws(), &cs("HEAD"), "testRecord", "testId1").unwrap(),
        Some(json!({ "id": 1, "name": "authoritative" }))
    );
}

#[test]
fn forced_overwrite_into_existing_snapshot_rebuilds_it() {
    let mut engine = seeded();
    engine
        .apply_forced_overwrite(&mjolnir(
            "HEAD",
            "HEAD",
            "HEAD",
            ("foobar", "fb1", "fb1"),
            json!({ "foo": "bar" }),
        ))
        .unwrap();
    assert_eq!(count_rows(&engine, Some("HEAD")), 4);
    assert_eq!(resolves_to(&engine, "HEAD").as_deref(), Some("HEAD"));
    assert_eq!(count_atoms(&engine), 4);
}

#[test]
fn forced_overwrite_without_any_parent_starts_empty() {
    let mut engine = Engine::in_memory().unwrap();
    engine
        .apply_forced_overwrite(&mjolnir(
            "cold",
            "0",
            "cold_ix",
            ("foobar", "fb1", "fb1"),
            json!(null),
        ))
        .unwrap();
    assert_eq!(count_rows(&engine, Some("cold_ix")), 1);
    assert_eq!(
        engine.get(&ws(), &cs("cold"), "foobar", "fb1").unwrap(),
        Some(Value::Null)
    );
}

#[test]
fn link_shares_the_source_snapshot() {
    let mut engine = seeded();
    assert!(engine
        .link_change_set(&ws(), &cs("HEAD"), &cs("linked"))
        .unwrap());
    assert_eq!(resolves_to(&engine, "linked").as_deref(), Some("HEAD"));
    assert_eq!(count_rows(&engine, None), 3);

    assert!(!engine
        .link_change_set(&ws(), &cs("HEAD"), &cs("linked"))
        .unwrap());

    let err = engine
        .link_change_set(&ws(), &cs("missing"), &cs("linked"))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownBranch(_)));

    // Advancing the linked branch leaves the trunk snapshot alone.
    let report = engine
        .apply_patch_batch(&batch("linked", "HEAD", "test_index_checksum_1", vec![rename()]))
        .unwrap();
    assert!(report.superseded.is_none());
    assert_eq!(count_rows(&engine, Some("HEAD")), 3);
}

#[test]
fn get_list_skips_dangling_references() {
    let mut engine = seeded();
    engine
        .apply_forced_overwrite(&mjolnir(
            "HEAD",
            "HEAD",
            "HEAD_2",
            ("testList", "changeSetId", "tl-dangling"),
            json!(["testRecord:testId2:tr2", "testRecord:testId9:gone", 42]),
        ))
        .unwrap();
    let resolved = engine
        .get_list(&ws(), &cs("HEAD"), "testList", "changeSetId")
        .unwrap();
    assert_eq!(resolved, vec![json!({ "id": 2, "name": "record 2" })]);
}

#[test]
fn reads_of_absent_objects() {
    let engine = seeded();
    assert!(engine
        .get(&ws(), &cs("HEAD"), "testRecord", "testId9")
        .unwrap()
        .is_none());
    assert!(engine
        .get(&ws(), &cs("no_branch"), "testRecord", "testId1")
        .unwrap()
        .is_none());
    assert!(engine
        .get_list(&ws(), &cs("HEAD"), "testList", "other")
        .unwrap()
        .is_empty());

    let err = engine
        .get_list(&ws(), &cs("HEAD"), "testRecord", "testId1")
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAList { .. }));
}

#[test]
fn invalidations_follow_commits() {
    let hook = BroadcastInvalidator::new(16);
    let mut rx = hook.subscribe();
    let mut engine = Engine::in_memory().unwrap().with_hook(Arc::new(hook));
    engine.apply_patch_batch(&seed_batch()).unwrap();
    for _ in 0..3 {
        let event = rx.try_recv().unwrap();
        assert_eq!(event.change_set_id, cs("HEAD"));
    }

    scenario_1(&mut engine);
    let event = rx.try_recv().unwrap();
    assert_eq!(event.workspace_id, ws());
    assert_eq!(event.change_set_id, cs("new_change_set"));
    assert_eq!((event.kind.as_str(), event.id.as_str()), ("testRecord", "testId1"));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    // Duplicates, prunes and links change no object value.
    engine
        .apply_patch_batch(&batch("new_change_set", "HEAD", "test_index_checksum_1", vec![rename()]))
        .unwrap();
    engine
        .link_change_set(&ws(), &cs("HEAD"), &cs("linked"))
        .unwrap();
    engine
        .prune_closed_branch(&ws(), &cs("new_change_set"))
        .unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn initialize_runs_once() {
    let mut engine = Engine::in_memory().unwrap();
    assert_eq!(engine.initialize().unwrap(), 0);
    engine.apply_patch_batch(&seed_batch()).unwrap();
    assert_eq!(engine.initialize().unwrap(), 0);
    assert_eq!(engine.stats().unwrap().last_seq, 1);
}

#[test]
fn stats_count_every_relation() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.atoms, 4);
    assert_eq!(stats.snapshots, 2);
    assert_eq!(stats.membership_rows, 6);
    assert_eq!(stats.branches, 2);
    assert_eq!(stats.last_seq, 2);
    assert!(stats.journal_bytes.is_none());
}

// ---- Durability ----

fn journaled(dir: &tempfile::TempDir) -> EngineConfig {
    EngineConfig::default().with_journal(JournalConfig::new(dir.path().join("cache.journal")))
}

#[test]
fn journal_replay_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let (digest, seq) = {
        let mut engine = Engine::open(journaled(&dir)).unwrap();
        engine.apply_patch_batch(&seed_batch()).unwrap();
        through_scenario_5(&mut engine);
        (engine.state_digest().unwrap(), engine.stats().unwrap().last_seq)
    };

    let mut reopened = Engine::new(journaled(&dir)).unwrap();
    assert_eq!(reopened.initialize().unwrap(), 6);
    assert_eq!(reopened.state_digest().unwrap(), digest);
    assert_eq!(reopened.stats().unwrap().last_seq, seq);
    assert_eq!(count_atoms(&reopened), 6);
}

#[test]
fn rejected_commands_are_not_journaled() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = Engine::open(journaled(&dir)).unwrap();
        engine.apply_patch_batch(&seed_batch()).unwrap();
        engine
            .apply_patch_batch(&batch("HEAD", "elsewhere", "next", vec![rename()]))
            .unwrap_err();
    }
    let mut reopened = Engine::new(journaled(&dir)).unwrap();
    assert_eq!(reopened.initialize().unwrap(), 1);
}

#[test]
fn compaction_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let digest = {
        let mut engine = Engine::open(journaled(&dir)).unwrap();
        engine.apply_patch_batch(&seed_batch()).unwrap();
        through_scenario_5(&mut engine);
        let size = engine.compact().unwrap();
        assert!(size > 0);
        assert_eq!(engine.stats().unwrap().journal_bytes, Some(size));
        engine.state_digest().unwrap()
    };

    let mut reopened = Engine::new(journaled(&dir)).unwrap();
    assert_eq!(reopened.initialize().unwrap(), 1);
    assert_eq!(reopened.state_digest().unwrap(), digest);
    assert_eq!(
        reopened
            .get_list(&ws(), &cs("list_change_set"), "testList", "changeSetId")
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn resync_to_empty_truncates_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = Engine::open(journaled(&dir)).unwrap();
        engine.apply_patch_batch(&seed_batch()).unwrap();
        let report = engine.full_resync(&ws(), &cs("HEAD"), false);
        assert!(report.journal_truncated);
        assert!(!report.degraded);
        assert_eq!(engine.stats().unwrap().journal_bytes, Some(0));
    }
    let mut reopened = Engine::new(journaled(&dir)).unwrap();
    assert_eq!(reopened.initialize().unwrap(), 0);
    assert_eq!(count_atoms(&reopened), 0);
}

#[test]
fn resync_without_force_keeps_other_branches() {
    let mut engine = seeded();
    scenario_1(&mut engine);
    let report = engine.full_resync(&ws(), &cs("new_change_set"), false);
    assert_eq!(report.reclaimed.branches_removed, 1);
    assert_eq!(report.reclaimed.atoms_swept, 1);
    assert!(!report.journal_truncated);
    assert_eq!(resolves_to(&engine, "HEAD").as_deref(), Some("HEAD"));
    assert_eq!(count_atoms(&engine), 3);
}

#[test]
fn zstd_codec_behaves_like_json() {
    let config = EngineConfig::from_toml_str("codec = \"zstd-json\"\ncompression_level = 5\n").unwrap();
    let mut engine = Engine::new(config).unwrap();
    engine.apply_patch_batch(&seed_batch()).unwrap();
    scenario_1(&mut engine);
    assert_eq!(engine.codec().name(), "zstd-json");
    assert_eq!(
        engine
            .get(&ws(), &cs("new_change_set"), "testRecord", "testId1")
            .unwrap(),
        Some(json!({ "id": 1, "name": "record 1 new name" }))
    );
}

fn rename_chain(names: &[String]) -> Vec<PatchBatch> {
    let mut from_ix = "HEAD".to_string();
    let mut from_cs = "tr1".to_string();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let to_ix = format!("chain_ix_{i}");
            let to_cs = format!("chain_cs_{i}");
            let b = batch(
                "HEAD",
                &from_ix,
                &to_ix,
                vec![modify(
                    "testRecord",
                    "testId1",
                    &from_cs,
                    &to_cs,
                    json!([{ "op": "replace", "path": "/name", "value": name }]),
                )],
            );
            from_ix = to_ix;
            from_cs = to_cs;
            b
        })
        .collect()
}

proptest! {
    #[test]
    fn applying_each_batch_twice_matches_applying_once(
        names in prop::collection::vec("[a-z ]{1,12}", 1..6)
    ) {
        let chain = rename_chain(&names);

        let mut once = seeded();
        for b in &chain {
            once.apply_patch_batch(b).unwrap();
        }

        let mut twice = seeded();
        for b in &chain {
            twice.apply_patch_batch(b).unwrap();
            let again = twice.apply_patch_batch(b).unwrap();
            prop_assert_eq!(again.outcome, ApplyOutcome::Duplicate);
        }

        prop_assert_eq!(once.state_digest().unwrap(), twice.state_digest().unwrap());
        let last = names.last().unwrap();
        prop_assert_eq!(
            twice.get(&ws(), &cs("HEAD"), "testRecord", "testId1").unwrap(),
            Some(json!({ "id": 1, "name": last }))
        );
    }
}
