use into_dbus::parser::{BasicType, CompleteType};
use into_dbus::ser::serializer_policy::StronglyTypedSerializerPolicy;
use into_dbus::ser::{to_value, to_value_with_policy};
use into_dbus::{signature, xformer, xformers, Data, DbusValue, Value};

use proptest::prelude::*;
use serde::Serialize;

fn arb_basic() -> impl Strategy<Value = BasicType> {
    prop_oneof![
        Just(BasicType::Byte),
        Just(BasicType::Boolean),
        Just(BasicType::Int16),
        Just(BasicType::UInt16),
        Just(BasicType::Int32),
        Just(BasicType::UInt32),
        Just(BasicType::Int64),
        Just(BasicType::UInt64),
        Just(BasicType::Double),
        Just(BasicType::UnixFd),
        Just(BasicType::String),
        Just(BasicType::ObjectPath),
        Just(BasicType::Signature),
    ]
}

fn arb_type() -> impl Strategy<Value = CompleteType> {
    let leaf = prop_oneof![
        3 => arb_basic().prop_map(CompleteType::Basic),
        1 => Just(CompleteType::Variant),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|elem| CompleteType::Array(Box::new(elem))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(CompleteType::Struct),
            (arb_basic(), inner).prop_map(|(key, value)| CompleteType::Dict(key, Box::new(value))),
        ]
    })
}

fn arb_basic_value(basic: BasicType) -> BoxedStrategy<Value> {
    match basic {
        BasicType::Byte => any::<u8>().prop_map(Value::from).boxed(),
        BasicType::Boolean => any::<bool>().prop_map(Value::from).boxed(),
        BasicType::Int16 => any::<i16>().prop_map(Value::from).boxed(),
        BasicType::UInt16 => any::<u16>().prop_map(Value::from).boxed(),
        BasicType::Int32 => any::<i32>().prop_map(Value::from).boxed(),
        BasicType::UInt32 => any::<u32>().prop_map(Value::from).boxed(),
        BasicType::Int64 => any::<i64>().prop_map(Value::from).boxed(),
        BasicType::UInt64 => any::<u64>().prop_map(Value::from).boxed(),
        BasicType::Double => (-1.0e6f64..1.0e6).prop_map(Value::from).boxed(),
        BasicType::UnixFd => (0i32..1024).prop_map(Value::from).boxed(),
        BasicType::String => "[a-zA-Z0-9 _]{0,8}".prop_map(Value::from).boxed(),
        BasicType::ObjectPath => "/|(/[A-Za-z0-9_]{1,4}){1,3}".prop_map(Value::from).boxed(),
        BasicType::Signature => arb_type()
            .prop_map(|ty| ty.to_string())
            .prop_filter("signature too long", |sig| sig.len() <= 255)
            .prop_map(Value::from)
            .boxed(),
    }
}

// Values fitting `ty`. `depth` bounds how many variants may nest inside
// each other, since each one picks a fresh type.
fn arb_value(ty: &CompleteType, depth: u32) -> BoxedStrategy<Value> {
    match ty {
        CompleteType::Basic(basic) => arb_basic_value(*basic),
        CompleteType::Array(elem) => prop::collection::vec(arb_value(elem, depth), 0..4)
            .prop_map(Value::Seq)
            .boxed(),
        CompleteType::Struct(members) => members
            .iter()
            .map(|member| arb_value(member, depth))
            .collect::<Vec<_>>()
            .prop_map(Value::Tuple)
            .boxed(),
        CompleteType::Dict(key, value) => {
            prop::collection::vec((arb_basic_value(*key), arb_value(value, depth)), 0..4)
                .prop_map(Value::Map)
                .boxed()
        }
        CompleteType::Variant => {
            let inner = if depth == 0 {
                arb_basic().prop_map(CompleteType::Basic).boxed()
            } else {
                arb_type().boxed()
            };
            inner
                .prop_flat_map(move |ty| {
                    let sig = ty.to_string();
                    arb_value(&ty, depth.saturating_sub(1))
                        .prop_map(move |value| Value::variant(&sig, value))
                })
                .boxed()
        }
    }
}

fn arb_signature_and_values() -> impl Strategy<Value = (String, Vec<Value>)> {
    prop::collection::vec(arb_type(), 0..4).prop_flat_map(|types| {
        let sig = types.iter().map(ToString::to_string).collect::<String>();
        let values = types
            .iter()
            .map(|ty| arb_value(ty, 2))
            .collect::<Vec<_>>();
        (Just(sig), values)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn pairs_reassemble_signature(types in prop::collection::vec(arb_type(), 0..5)) {
        let sig = types.iter().map(ToString::to_string).collect::<String>();
        let pairs = xformers(&sig).expect("generated signature compiles");
        prop_assert_eq!(pairs.len(), types.len());
        for ((_, matched), ty) in pairs.iter().zip(&types) {
            prop_assert_eq!(matched, &ty.to_string());
        }
        let joined = pairs.iter().map(|(_, s)| s.as_str()).collect::<String>();
        prop_assert_eq!(joined, sig);
    }

    #[test]
    fn signature_inverts_xformer((sig, values) in arb_signature_and_values()) {
        let xformed = xformer(&sig)
            .and_then(|func| func.transform(&values))
            .expect("generated values fit their signature");
        prop_assert_eq!(xformed.len(), values.len());
        let recovered = xformed
            .iter()
            .map(signature)
            .collect::<into_dbus::Result<String>>()
            .expect("xformed values have a signature");
        prop_assert_eq!(recovered, sig);
    }

    #[test]
    fn xformers_are_reusable((sig, values) in arb_signature_and_values()) {
        let func = xformer(&sig).expect("generated signature compiles");
        let first = func.transform(&values).expect("values fit");
        let second = func.transform(&values).expect("values fit");
        prop_assert_eq!(first, second);
    }
}

#[test_log::test]
fn serialized_values_fit() -> into_dbus::Result<()> {
    #[derive(Serialize)]
    struct Reading {
        sensor: String,
        count: u32,
        samples: Vec<f64>,
    }

    let reading = Reading {
        sensor: "temp".to_owned(),
        count: 2,
        samples: vec![20.5, 21.0],
    };

    let func = xformer("(suad)")?;
    let typed = func.transform(&[to_value_with_policy(&reading, StronglyTypedSerializerPolicy)?])?;
    assert_eq!(signature(&typed[0])?, "(suad)");

    // Under the default policy a struct is a map of its fields.
    let func = xformer("a{ss}")?;
    assert!(func.transform(&[to_value(&reading)?]).is_err());
    let labels = vec![("unit", "celsius"), ("room", "lab")]
        .into_iter()
        .collect::<std::collections::BTreeMap<_, _>>();
    let typed = func.transform(&[to_value(&labels)?])?;
    match &typed[0].data {
        Data::Dictionary { entries, .. } => assert_eq!(entries.len(), 2),
        other => panic!("expected a dictionary, got {:?}", other),
    }
    Ok(())
}

#[test_log::test]
fn nested_variant_levels() -> into_dbus::Result<()> {
    let typed = xformer("v")?.transform(&[Value::variant(
        "av",
        vec![Value::variant("q", 0)],
    )])?;
    assert_eq!(typed[0].variant_level, 2);
    match &typed[0].data {
        Data::Array { items, .. } => {
            assert_eq!(items, &vec![DbusValue::with_variant_level(Data::UInt16(0), 1)])
        }
        other => panic!("expected an array, got {:?}", other),
    }
    Ok(())
}
