use rust_decimal::Decimal;
use serde_json::json;

use super::*;

fn fields(pairs: &[(&str, &str)]) -> FormFields {
    let mut f = FormFields::new();
    for (k, v) in pairs {
        f.insert(*k, *v);
    }
    f
}

#[test]
fn absent_and_blank_batches_are_absent() {
    assert_eq!(decode_variants(None), BatchField::Absent);
    assert_eq!(decode_variants(Some("   ")), BatchField::Absent);
    assert_eq!(decode_id_list(Some("")), BatchField::Absent);
}

#[test]
fn malformed_batch_is_reported_not_raised() {
    assert!(matches!(
        decode_variants(Some("[{\"name\": ")),
        BatchField::Malformed(_)
    ));
    match decode_id_list(Some("{\"ids\": [1]}")) {
        BatchField::Malformed(reason) => assert!(reason.contains("an object"), "{reason}"),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn empty_array_is_a_supplied_empty_batch() {
    assert_eq!(decode_variants(Some("[]")), BatchField::Supplied(vec![]));
    assert_eq!(decode_id_list(Some("[]")), BatchField::Supplied(vec![]));
}

#[test]
fn variants_accept_string_and_number_prices() {
    let batch = decode_variants(Some(
        r#"[{"name": "100 un", "price": "39,90"}, {"name": "500 un", "price": 120.5}]"#,
    ));
    assert_eq!(
        batch,
        BatchField::Supplied(vec![
            VariantSpec {
                name: "100 un".to_string(),
                price: Decimal::new(3990, 2),
            },
            VariantSpec {
                name: "500 un".to_string(),
                price: Decimal::new(12050, 2),
            },
        ])
    );
}

#[test]
fn invalid_variant_rows_are_filtered_out() {
    let batch = decode_variants(Some(
        r#"[{"name": "", "price": ""}, {"name": "ok", "price": "-3"}, {"price": "5"}, {"name": "kept", "price": "5"}]"#,
    ));
    let kept = batch.supplied().expect("supplied");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "kept");
}

#[test]
fn all_rows_invalid_still_supplies_an_empty_batch() {
    let batch = decode_variants(Some(r#"[{"name": "", "price": ""}]"#));
    assert_eq!(batch, BatchField::Supplied(vec![]));
}

#[test]
fn id_lists_dedupe_and_drop_junk() {
    let batch = decode_id_list(Some(r#"[1, "2", 2, 0, -4, "x", null, 5, 1.5]"#));
    assert_eq!(batch, BatchField::Supplied(vec![1, 2, 5]));
}

#[test]
fn from_json_flattens_values() {
    let f = FormFields::from_json(json!({
        "name": "Flyer",
        "category": 3,
        "is_featured": true,
        "description": null,
        "variants": [{"name": "A5", "price": "10"}],
    }))
    .expect("object");

    assert_eq!(f.get("name"), Some("Flyer"));
    assert_eq!(f.get("category"), Some("3"));
    assert_eq!(f.get("is_featured"), Some("true"));
    assert_eq!(f.get("description"), Some(""));
    assert_eq!(
        decode_variants(f.get("variants")).supplied().map(<[_]>::len),
        Some(1)
    );
}

#[test]
fn from_json_rejects_non_objects() {
    assert_eq!(
        FormFields::from_json(json!([1, 2])),
        Err(PayloadError::NotAnObject)
    );
}

#[test]
fn product_input_decodes_multipart_style_fields() {
    let input = ProductInput::from_fields(&fields(&[
        ("name", "  Cartão de Visita "),
        ("category", "4"),
        ("production_time", "2 dias úteis"),
        ("is_featured", "true"),
        ("description", ""),
        ("image", ""),
        ("variants_json", r#"[{"name": "100 un", "price": "39.90"}]"#),
        ("finishings_json", "[1,2,5]"),
        ("upsells_json", "not json"),
    ]))
    .expect("valid input");

    assert_eq!(input.name.as_deref(), Some("Cartão de Visita"));
    assert_eq!(input.category_id, Some(4));
    assert_eq!(input.is_featured, Some(true));
    assert_eq!(input.is_active, None);
    assert_eq!(input.description, Some(None));
    assert_eq!(input.image, None);
    assert_eq!(input.slug, None);
    assert_eq!(input.variants.supplied().map(<[_]>::len), Some(1));
    assert_eq!(input.finishings, BatchField::Supplied(vec![1, 2, 5]));
    assert!(matches!(input.upsells, BatchField::Malformed(_)));
    assert_eq!(input.required_for_create(), Ok(("Cartão de Visita", 4)));
}

#[test]
fn product_input_normalizes_supplied_slug() {
    let input = ProductInput::from_fields(&fields(&[("slug", "Meu Produto!")])).expect("valid");
    assert_eq!(input.slug.as_deref(), Some("meu-produto"));

    let err = ProductInput::from_fields(&fields(&[("slug", "???")])).unwrap_err();
    assert!(matches!(err, PayloadError::Invalid { field: "slug", .. }));
}

#[test]
fn product_input_rejects_bad_scalars() {
    let err = ProductInput::from_fields(&fields(&[("name", "   ")])).unwrap_err();
    assert!(matches!(err, PayloadError::Invalid { field: "name", .. }));

    let err = ProductInput::from_fields(&fields(&[("discount_percent", "150")])).unwrap_err();
    assert!(matches!(
        err,
        PayloadError::Invalid {
            field: "discount_percent",
            ..
        }
    ));

    let err = ProductInput::from_fields(&fields(&[("is_on_sale", "maybe")])).unwrap_err();
    assert!(matches!(err, PayloadError::Invalid { field: "is_on_sale", .. }));

    let err = ProductInput::from_fields(&fields(&[("category", "abc")])).unwrap_err();
    assert!(matches!(err, PayloadError::Invalid { field: "category", .. }));
}

#[test]
fn product_create_requires_name_and_category() {
    let input = ProductInput::from_fields(&fields(&[("category", "1")])).expect("valid");
    assert_eq!(
        input.required_for_create(),
        Err(PayloadError::Missing { field: "name" })
    );

    let input = ProductInput::from_fields(&fields(&[("name", "Banner")])).expect("valid");
    assert_eq!(
        input.required_for_create(),
        Err(PayloadError::Missing { field: "category" })
    );
}

#[test]
fn kit_input_decodes_price_and_products() {
    let input = KitInput::from_fields(&fields(&[
        ("name", "Kit Empreendedor"),
        ("price", "199,90"),
        ("is_active", "false"),
        ("products_json", r#"["3", 7]"#),
    ]))
    .expect("valid");

    assert_eq!(input.price, Some(Decimal::new(19990, 2)));
    assert_eq!(input.is_active, Some(false));
    assert_eq!(input.products, BatchField::Supplied(vec![3, 7]));
    assert_eq!(
        input.required_for_create(),
        Ok(("Kit Empreendedor", Decimal::new(19990, 2)))
    );
}

#[test]
fn kit_input_rejects_negative_price() {
    let err = KitInput::from_fields(&fields(&[("price", "-10")])).unwrap_err();
    assert!(matches!(err, PayloadError::Invalid { field: "price", .. }));
}
