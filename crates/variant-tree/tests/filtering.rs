//! Integration tests for filter visibility.

use variant_tree::{
    AddressPath, ContainerRef, Filter, FilterColumns, FilterMode, ItemModel, ModelConfig, ModelIndex, RowCache,
    RowContext, Variant, VariantModel, address,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn inventory() -> Variant {
    Variant::ordered_map([
        (
            "fruit",
            Variant::list([
                Variant::ordered_map([("name", Variant::from("apple")), ("count", Variant::from(3))]),
                Variant::ordered_map([("name", Variant::from("plum")), ("ripe", Variant::from(false))]),
            ]),
        ),
        ("owner", Variant::from("ana")),
        ("ratio", Variant::from(0.25)),
        ("tags", Variant::unordered_map([("seasonal", true), ("local", false)])),
        ("empty", Variant::list(Vec::<Variant>::new())),
    ])
}

fn expand_all(model: &mut VariantModel, parent: &ModelIndex) {
    for row in 0..model.row_count(parent) {
        let index = model.index(row, 0, parent);
        if model.can_fetch_more(&index) {
            model.fetch_more(&index);
        }
        expand_all(model, &index);
    }
}

/// Every address under `value`, children after their parent.
fn addresses(value: &Variant, at: AddressPath, out: &mut Vec<(AddressPath, Variant)>) {
    if let Some(container) = ContainerRef::new(value) {
        for (key, child) in container.entries() {
            let address = at.child(key);
            out.push((address.clone(), child.clone()));
            addresses(child, address, out);
        }
    }
}

/// Whether the row at `address` or any row below it passes `filter`.
fn subtree_accepted(filter: &Filter, address: &AddressPath, value: &Variant, depth: usize) -> bool {
    let row = RowCache::compute(address.last(), value, &RowContext::root(depth));
    if filter.accepts_row(&row) {
        return true;
    }
    let Some(container) = ContainerRef::new(value) else {
        return false;
    };
    container
        .entries()
        .into_iter()
        .any(|(key, child)| subtree_accepted(filter, &address.child(key), child, depth))
}

fn check_closure(pattern: &str, mode: FilterMode, columns: FilterColumns) {
    let mut model = VariantModel::with_root(inventory()).unwrap();
    expand_all(&mut model, &ModelIndex::invalid());
    model.set_filter(pattern, mode, columns).unwrap();

    let mut all = Vec::new();
    addresses(&inventory(), address![], &mut all);
    for (address, value) in all {
        let expected = subtree_accepted(model.filter(), &address, &value, model.display_depth());
        assert_eq!(
            model.is_visible(&address),
            expected,
            "{address} with {pattern:?} on {columns:?}"
        );
    }
}

#[test]
fn test_closure_on_keys() {
    setup();
    check_closure("name", FilterMode::Contains, FilterColumns::KEY);
    check_closure("?ip?", FilterMode::Wildcard, FilterColumns::KEY);
}

#[test]
fn test_closure_on_values() {
    setup();
    check_closure("plum", FilterMode::Fixed, FilterColumns::VALUE);
    check_closure("(true|3)", FilterMode::Regex, FilterColumns::VALUE);
}

#[test]
fn test_closure_on_types() {
    setup();
    check_closure("Boolean", FilterMode::Fixed, FilterColumns::TYPE);
    check_closure("Do*", FilterMode::Wildcard, FilterColumns::TYPE);
}

#[test]
fn test_string_cells_match_without_quotes() {
    setup();
    let mut model = VariantModel::with_root(Variant::ordered_map([("a", 1), ("b", 2)])).unwrap();
    model.set_filter("a", FilterMode::Fixed, FilterColumns::KEY).unwrap();
    assert!(model.is_visible(&address!["a"]));
    assert!(!model.is_visible(&address!["b"]));
    assert_eq!(model.row_count(&ModelIndex::invalid()), 1);

    let mut model = VariantModel::with_root(Variant::list(["x", "y"])).unwrap();
    model.set_filter("x", FilterMode::Regex, FilterColumns::VALUE).unwrap();
    assert!(model.is_visible(&address![0]));
    assert!(!model.is_visible(&address![1]));

    // An unexpanded container matches through its string descendants too.
    let mut model = VariantModel::with_root(inventory()).unwrap();
    model.set_filter("plum", FilterMode::Fixed, FilterColumns::VALUE).unwrap();
    assert!(model.is_visible(&address!["fruit"]));
    assert!(!model.is_visible(&address!["owner"]));

    model.set_filter("an", FilterMode::Contains, FilterColumns::VALUE).unwrap();
    assert!(model.is_visible(&address!["owner"]));
}

#[test]
fn test_clearing_filter_restores_rows() {
    setup();
    let mut model = VariantModel::with_root(inventory()).unwrap();
    expand_all(&mut model, &ModelIndex::invalid());
    let before = model.visible_keys(&address![]).unwrap();

    model.set_filter("nothing matches this", FilterMode::Contains, FilterColumns::ALL).unwrap();
    assert_eq!(model.row_count(&ModelIndex::invalid()), 0);

    model.set_filter("", FilterMode::Contains, FilterColumns::ALL).unwrap();
    assert_eq!(model.visible_keys(&address![]).unwrap(), before);
    assert!(model.is_visible(&address!["fruit", 1, "ripe"]));
}

#[test]
fn test_unexpanded_container_matches_through_descendants() {
    setup();
    let mut model = VariantModel::with_root(inventory()).unwrap();
    model.set_filter("ripe", FilterMode::Contains, FilterColumns::KEY).unwrap();

    // "fruit" is not expanded, yet a descendant key matches.
    assert!(model.is_visible(&address!["fruit"]));
    assert!(!model.is_visible(&address!["owner"]));

    let fruit = model.index_for_address(&address!["fruit"], variant_tree::Column::Key).unwrap();
    model.fetch_more(&fruit);
    assert!(model.is_visible(&address!["fruit", 1]));
    assert!(!model.is_visible(&address!["fruit", 0]));
}

#[test]
fn test_edit_reevaluates_filter() {
    setup();
    let mut model = VariantModel::with_root(inventory()).unwrap();
    model.set_filter("ana", FilterMode::Contains, FilterColumns::VALUE).unwrap();
    assert!(model.is_visible(&address!["owner"]));

    model.set_value(&address!["owner"], Variant::from("bo")).unwrap();
    assert!(!model.is_visible(&address!["owner"]));

    model.map_set(&address![], "heir", Variant::from("hana")).unwrap();
    assert!(model.is_visible(&address!["heir"]));
}

#[test]
fn test_filter_from_config() {
    setup();
    let config = ModelConfig::from_toml_str(
        r#"
        [filter]
        pattern = "own*"
        mode = "wildcard"
        columns = { value = false, type = false }
        "#,
    )
    .unwrap();
    let mut model = VariantModel::with_config(config).unwrap();
    model.set_root_content(inventory());

    assert_eq!(model.filter().mode(), FilterMode::Wildcard);
    assert_eq!(model.visible_keys(&address![]).unwrap().len(), 1);
    assert!(model.is_visible(&address!["owner"]));
}
