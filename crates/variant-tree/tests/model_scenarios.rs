//! Integration tests for editing through the model.

use std::sync::Arc;

use parking_lot::Mutex;
use variant_tree::{
    AddressPath, Column, FilterColumns, FilterMode, ItemModel, Key, ModelEvent, ModelIndex, TreeError, Variant,
    VariantModel, address,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn record(model: &VariantModel) -> Arc<Mutex<Vec<ModelEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    model.signals().changed.connect(move |event| sink.lock().push(event.clone()));
    events
}

fn mixed() -> Variant {
    Variant::list([
        Variant::from(5),
        Variant::from("x"),
        Variant::ordered_map([("a", Variant::from(-1)), ("b", Variant::from(true))]),
    ])
}

/// Materialize every container reachable through visible rows.
fn expand_all(model: &mut VariantModel, parent: &ModelIndex) {
    for row in 0..model.row_count(parent) {
        let index = model.index(row, 0, parent);
        if model.can_fetch_more(&index) {
            model.fetch_more(&index);
        }
        expand_all(model, &index);
    }
}

#[test]
fn test_filter_keeps_path_to_match() {
    setup();
    let mut model = VariantModel::with_root(mixed()).unwrap();
    expand_all(&mut model, &ModelIndex::invalid());

    model.set_filter("a", FilterMode::Contains, FilterColumns::KEY).unwrap();

    assert!(!model.is_visible(&address![0]));
    assert!(!model.is_visible(&address![1]));
    assert!(model.is_visible(&address![2]));
    assert_eq!(model.visible_keys(&address![]).unwrap(), vec![Key::from(2)]);
    assert_eq!(model.visible_keys(&address![2]).unwrap(), vec![Key::from("a")]);
    assert_eq!(model.row_count(&ModelIndex::invalid()), 1);
}

#[test]
fn test_set_keeps_siblings() {
    setup();
    let mut model = VariantModel::with_root(mixed()).unwrap();

    model.set_value(&address![2, "a"], Variant::from(42)).unwrap();

    assert_eq!(model.get(&address![2, "a"]).unwrap(), Variant::from(42));
    assert_eq!(model.get(&address![0]).unwrap(), Variant::from(5));
    assert_eq!(model.cell_text(&address![2], Column::Value), Some("{\"a\": 42, \"b\": true}"));
}

#[test]
fn test_list_insert_conventions() {
    setup();
    let mut model = VariantModel::with_root(Variant::list(["p", "q", "r"])).unwrap();

    assert_eq!(model.list_insert(&address![], -1, Variant::from("end")).unwrap(), 3);
    assert_eq!(model.get(&address![3]).unwrap(), Variant::from("end"));

    assert_eq!(model.list_insert(&address![], 1, Variant::from("new")).unwrap(), 1);
    assert_eq!(model.get(&address![2]).unwrap(), Variant::from("q"));
    assert_eq!(model.get(&address![3]).unwrap(), Variant::from("r"));
    assert_eq!(model.cell_text(&address![2], Column::Value), Some("\"q\""));
    assert_eq!(model.cell_text(&address![4], Column::Key), Some("4"));
    assert_eq!(model.row_count(&ModelIndex::invalid()), 5);
}

// Renaming onto an existing key replaces that entry.
#[test]
fn test_rename_onto_existing_key() {
    setup();
    let mut model = VariantModel::with_root(Variant::ordered_map([
        ("a", Variant::from(1)),
        ("b", Variant::from(2)),
    ]))
    .unwrap();

    model.map_rename_key(&address![], "a", "b").unwrap();

    assert_eq!(model.get(&address!["b"]).unwrap(), Variant::from(1));
    assert!(model.get(&address!["a"]).is_err());
    assert_eq!(model.visible_keys(&address![]).unwrap(), vec![Key::from("b")]);
    assert_eq!(model.row_count(&ModelIndex::invalid()), 1);
}

#[test]
fn test_rows_recomputed_only_on_path() {
    setup();
    let root = Variant::ordered_map([
        ("left", Variant::list([1, 2, 3])),
        ("right", Variant::ordered_map([("deep", Variant::list([4]))])),
    ]);
    let mut model = VariantModel::with_root(root).unwrap();
    expand_all(&mut model, &ModelIndex::invalid());

    let all: Vec<AddressPath> = vec![
        address!["left"],
        address!["left", 0],
        address!["left", 1],
        address!["left", 2],
        address!["right"],
        address!["right", "deep"],
        address!["right", "deep", 0],
    ];
    let before: Vec<u64> = all.iter().map(|a| model.row_revision(a).unwrap()).collect();

    model.set_value(&address!["right", "deep", 0], Variant::from(40)).unwrap();

    for (address, old) in all.iter().zip(before) {
        let on_path = address!["right", "deep", 0].starts_with(address);
        let expected = if on_path { old + 1 } else { old };
        assert_eq!(model.row_revision(address), Some(expected), "revision of {address}");
    }
}

#[test]
fn test_event_order_follows_operations() {
    setup();
    let mut model = VariantModel::with_root(Variant::list([1, 2, 3])).unwrap();
    let events = record(&model);

    model.list_append(&address![], Variant::from(4)).unwrap();
    model.list_remove_at(&address![], 0).unwrap();

    let recorded = events.lock();
    let structural: Vec<&ModelEvent> = recorded.iter().filter(|e| e.is_structural()).collect();
    assert_eq!(
        structural,
        vec![
            &ModelEvent::RowsInserted {
                parent: address![],
                first: 3,
                last: 3
            },
            &ModelEvent::RowsRemoved {
                parent: address![],
                first: 0,
                last: 0
            },
        ]
    );
    // Re-keyed rows are announced after the removal went out.
    let removal = recorded
        .iter()
        .position(|e| matches!(e, ModelEvent::RowsRemoved { .. }))
        .unwrap();
    assert!(recorded[removal + 1..].contains(&ModelEvent::DataChanged { address: address![0] }));
}

#[test]
fn test_failed_commits_change_nothing() {
    setup();
    let mut model = VariantModel::with_root(mixed()).unwrap();
    expand_all(&mut model, &ModelIndex::invalid());
    let events = record(&model);
    let revision = model.row_revision(&address![1]).unwrap();

    let err = model.commit_edit(&address![1], Column::Type, Variant::from("uint"));
    assert!(matches!(err, Err(TreeError::TypeConversionUnsupported { .. })));
    let err = model.commit_edit(&address![2], Column::Value, Variant::from(0));
    assert!(matches!(err, Err(TreeError::NotEditable { .. })));
    let err = model.commit_edit(&address![2, "zz"], Column::Value, Variant::from(0));
    assert!(matches!(err, Err(TreeError::AddressNotFound { .. })));

    assert_eq!(model.root_value(), &mixed());
    assert_eq!(model.row_revision(&address![1]), Some(revision));
    assert!(events.lock().is_empty());
}

#[test]
fn test_type_commit_converts_container() {
    setup();
    let mut model = VariantModel::with_root(mixed()).unwrap();
    let map = model.index_for_address(&address![2], Column::Key).unwrap();
    model.fetch_more(&map);
    assert_eq!(model.row_count(&map), 2);

    model.commit_edit(&address![2], Column::Type, Variant::from("List")).unwrap();

    assert_eq!(model.get(&address![2]).unwrap(), Variant::list([Variant::from(-1), Variant::from(true)]));
    assert_eq!(model.cell_text(&address![2], Column::Type), Some("List"));
    assert_eq!(model.visible_keys(&address![2]).unwrap(), vec![Key::from(0), Key::from(1)]);
}

#[test]
fn test_dynamic_sort_survives_edits() {
    setup();
    let mut model = VariantModel::with_root(Variant::ordered_map([
        ("pear", Variant::from(1)),
        ("fig", Variant::from(2)),
    ]))
    .unwrap();
    model.set_dynamic_sort(true);
    assert_eq!(model.visible_keys(&address![]).unwrap(), vec![Key::from("fig"), Key::from("pear")]);

    model.map_set(&address![], "kiwi", Variant::from(3)).unwrap();
    assert_eq!(
        model.visible_keys(&address![]).unwrap(),
        vec![Key::from("fig"), Key::from("kiwi"), Key::from("pear")]
    );

    model.map_rename_key(&address![], "pear", "apple").unwrap();
    assert_eq!(
        model.visible_keys(&address![]).unwrap(),
        vec![Key::from("fig"), Key::from("kiwi"), Key::from("apple")]
    );
}

#[test]
fn test_delete_root_resets() {
    setup();
    let mut model = VariantModel::with_root(mixed()).unwrap();
    let events = record(&model);

    assert_eq!(model.delete(&address![]).unwrap(), mixed());
    assert_eq!(model.root_value(), &Variant::Invalid);
    assert_eq!(model.row_count(&ModelIndex::invalid()), 0);
    assert_eq!(*events.lock(), vec![ModelEvent::Reset]);
}
