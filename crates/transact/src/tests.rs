use crate::*;

use parcel::ParcelReader;
use parcel::ParcelWriter;
use parcel::Tag;
use rand::Rng;

const POINT: StructSchema = StructSchema {
    name: "Point",
    fields: &[
        Field { name: "x", ty: Type::Int },
        Field { name: "label", ty: Type::String },
    ],
};
const POINT_TYPE: Type = Type::Struct(&POINT);
const POINTS: Type = Type::List(&POINT_TYPE);

fn point(x: i32, label: &str) -> Value {
    Value::Struct(vec![Value::Int(x), Value::String(label.into())])
}

fn assert_roundtrip(value: Value, ty: Type) {
    let bytes = encode_result(&value).expect("encoding failed");
    let decoded = decode_result(&bytes, &ty).expect("decoding failed");
    assert_eq!(value, decoded);
}

// ============================================================================
//  VALUES
// ============================================================================

#[test]
fn test_scalar_values_roundtrip() {
    assert_roundtrip(Value::Void, Type::Void);
    assert_roundtrip(Value::Bool(true), Type::Bool);
    assert_roundtrip(Value::Bool(false), Type::Bool);
    assert_roundtrip(Value::Int(-3), Type::Int);
    assert_roundtrip(Value::Long(i64::MIN), Type::Long);
    assert_roundtrip(Value::String("com.example.app".into()), Type::String);
    assert_roundtrip(Value::Bytes(vec![0xCA, 0xFE]), Type::Bytes);
    assert_roundtrip(Value::Binder(ObjectId(12)), Type::Interface("x.IFoo"));
}

#[test]
fn test_container_values_roundtrip() {
    assert_roundtrip(Value::List(vec![]), Type::List(&Type::String));
    assert_roundtrip(
        Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
        Type::List(&Type::String),
    );
    assert_roundtrip(point(1, "one"), POINT_TYPE);
    assert_roundtrip(Value::List(vec![point(1, "one"), point(2, "")]), POINTS);
}

#[test]
fn test_struct_skips_unknown_trailing_fields() -> Result<()> {
    // A newer peer appended a third field.
    let wide = Value::Struct(vec![Value::Int(7), Value::String("p".into()), Value::Long(99)]);
    let bytes = encode_result(&wide)?;
    assert_eq!(decode_result(&bytes, &POINT_TYPE)?, point(7, "p"));
    Ok(())
}

#[test]
fn test_struct_missing_field_is_rejected() -> Result<()> {
    let narrow = Value::Struct(vec![Value::Int(7)]);
    let bytes = encode_result(&narrow)?;
    assert!(matches!(
        decode_result(&bytes, &POINT_TYPE),
        Err(Error::Parcel(parcel::Error::UnexpectedEnd))
    ));
    Ok(())
}

#[test]
fn test_conforms_checks_structure() {
    assert!(point(1, "a").conforms(&POINT_TYPE));
    assert!(!Value::Struct(vec![Value::Int(1)]).conforms(&POINT_TYPE));
    assert!(!Value::List(vec![Value::Int(1)]).conforms(&Type::List(&Type::String)));
    assert!(Value::Binder(ObjectId(1)).conforms(&Type::Interface("any")));

    let err = check(&Value::Int(1), &Type::String).unwrap_err();
    assert_eq!(err, Error::TypeMismatch { expected: "String".into(), found: "int".into() });
}

#[test]
fn test_encode_rejects_deep_nesting() {
    let mut value = Value::Void;
    for _ in 0..100 {
        value = Value::List(vec![value]);
    }
    assert_eq!(encode_result(&value).unwrap_err(), Error::RecursionLimitExceeded);
}

// ============================================================================
//  ARGUMENTS
// ============================================================================

const PARAMS: &[Param] = &[
    Param { name: "packageName", ty: Type::String },
    Param { name: "userId", ty: Type::Int },
];

#[test]
fn test_args_roundtrip() -> Result<()> {
    let args = vec![Value::String("com.example".into()), Value::Int(10)];
    let payload = encode_args(&args)?;
    assert_eq!(decode_args(&payload, PARAMS)?, args);
    Ok(())
}

#[test]
fn test_args_tag_mismatch() -> Result<()> {
    let payload = encode_args(&[Value::Int(1), Value::Int(2)])?;
    assert_eq!(
        decode_args(&payload, PARAMS).unwrap_err(),
        Error::Parcel(parcel::Error::TagMismatch { expected: Tag::String, found: Tag::I32 })
    );
    Ok(())
}

#[test]
fn test_args_reject_trailing_bytes() -> Result<()> {
    let payload = encode_args(&[
        Value::String("com.example".into()),
        Value::Int(0),
        Value::Bool(true),
    ])?;
    assert_eq!(
        decode_args(&payload, PARAMS).unwrap_err(),
        Error::Parcel(parcel::Error::TrailingBytes(1))
    );
    Ok(())
}

#[test]
fn test_empty_args() -> Result<()> {
    assert!(encode_args(&[])?.is_empty());
    assert!(decode_args(&[], &[])?.is_empty());
    Ok(())
}

#[test]
fn test_truncated_results_are_rejected() -> Result<()> {
    let mut rng = rand::thread_rng();

    for _ in 0..32 {
        let items = (0..rng.gen_range(0..5))
            .map(|_| {
                let len = rng.gen_range(0..12);
                let label: String = (0..len).map(|_| rng.gen_range('a'..='z')).collect();
                point(rng.r#gen(), &label)
            })
            .collect::<Vec<_>>();
        let bytes = encode_result(&Value::List(items))?;

        for cut in 0..bytes.len() {
            assert!(decode_result(&bytes[..cut], &POINTS).is_err(), "prefix of {} bytes decoded", cut);
        }
    }
    Ok(())
}

#[test]
fn test_decode_value_leaves_reader_positioned() -> Result<()> {
    let mut w = ParcelWriter::new();
    encode_value(&mut w, &point(3, "z"))?;
    w.i32(5);
    let bytes = w.into_bytes()?;

    let mut r = ParcelReader::new(&bytes);
    assert_eq!(decode_value(&mut r, &POINT_TYPE)?, point(3, "z"));
    assert_eq!(r.i32()?, 5);
    Ok(())
}

// ============================================================================
//  FRAMES
// ============================================================================

#[test]
fn test_transaction_layout() -> Result<()> {
    let frame = Transaction::new(2, vec![0xAA, 0xBB]).encode()?;
    assert_eq!(frame, vec![2, 0, 0, 0, 2, 0, 0, 0, 0xAA, 0xBB]);
    assert_eq!(Transaction::decode(&frame)?, Transaction::new(2, vec![0xAA, 0xBB]));
    Ok(())
}

#[test]
fn test_reply_layout() -> Result<()> {
    let frame = Reply::new(Status::RemoteException, vec![1]).encode()?;
    assert_eq!(frame, vec![1, 1, 0, 0, 0, 1]);
    assert_eq!(Reply::decode(&frame)?, Reply::new(Status::RemoteException, vec![1]));
    assert_eq!(Reply::decode(&Reply::bare(Status::Ok).encode()?)?, Reply::bare(Status::Ok));
    Ok(())
}

#[test]
fn test_frame_length_must_match() -> Result<()> {
    let mut frame = Transaction::new(1, vec![1, 2, 3]).encode()?;
    frame.push(4);
    assert!(matches!(Transaction::decode(&frame), Err(Error::Frame(_))));

    frame.truncate(frame.len() - 2);
    assert!(matches!(Transaction::decode(&frame), Err(Error::Frame(_))));

    assert!(matches!(Transaction::decode(&[1, 0]), Err(Error::Frame(_))));
    assert!(matches!(Reply::decode(&[]), Err(Error::Frame(_))));
    Ok(())
}

#[test]
fn test_reply_unknown_status() {
    assert_eq!(Reply::decode(&[9, 0, 0, 0, 0]).unwrap_err(), Error::UnknownStatus(9));
}

// ============================================================================
//  EXCEPTIONS
// ============================================================================

#[test]
fn test_exception_roundtrip() -> Result<()> {
    let ex = RemoteException::illegal_state("session 42 already committed");
    let payload = ex.encode()?;

    let mut r = ParcelReader::new(&payload);
    assert_eq!(r.str()?, "IllegalStateException");
    assert_eq!(r.str()?, "session 42 already committed");

    assert_eq!(RemoteException::decode(&payload)?, ex);
    assert_eq!(ex.to_string(), "IllegalStateException: session 42 already committed");
    Ok(())
}

#[test]
fn test_exception_payload_must_be_two_strings() -> Result<()> {
    let payload = encode_args(&[Value::String("SecurityException".into())])?;
    assert!(RemoteException::decode(&payload).is_err());
    Ok(())
}

// ============================================================================
//  DESCRIPTORS
// ============================================================================

const THROWS: &[&str] = &[exception::ILLEGAL_ARGUMENT];

static GOOD: Descriptor = Descriptor {
    name: "test.IGood",
    methods: &[
        Method { name: "ping", code: 1, params: &[], result: Type::Void, throws: THROWS },
        Method { name: "echo", code: 2, params: PARAMS, result: Type::String, throws: &[] },
    ],
};

static RESERVED: Descriptor = Descriptor {
    name: "test.IReserved",
    methods: &[Method { name: "ping", code: INTERFACE_TRANSACTION, params: &[], result: Type::Void, throws: &[] }],
};

static SHARED_CODE: Descriptor = Descriptor {
    name: "test.ISharedCode",
    methods: &[
        Method { name: "a", code: 1, params: &[], result: Type::Void, throws: &[] },
        Method { name: "b", code: 1, params: &[], result: Type::Void, throws: &[] },
    ],
};

static SHARED_NAME: Descriptor = Descriptor {
    name: "test.ISharedName",
    methods: &[
        Method { name: "a", code: 1, params: &[], result: Type::Void, throws: &[] },
        Method { name: "a", code: 2, params: &[], result: Type::Void, throws: &[] },
    ],
};

static VOID_PARAM: Descriptor = Descriptor {
    name: "test.IVoidParam",
    methods: &[Method {
        name: "a",
        code: 1,
        params: &[Param { name: "nothing", ty: Type::Void }],
        result: Type::Void,
        throws: &[],
    }],
};

#[test]
fn test_descriptor_lookup() {
    assert!(GOOD.validate().is_ok());
    assert_eq!(GOOD.method(2).map(|m| m.name), Some("echo"));
    assert_eq!(GOOD.method_named("ping").map(|m| m.code), Some(1));
    assert!(GOOD.method(INTERFACE_TRANSACTION).is_none());
    assert!(GOOD.method(3).is_none());

    let ping = GOOD.method(1).expect("ping");
    assert!(ping.declares("IllegalArgumentException"));
    assert!(!ping.declares("SecurityException"));
}

#[test]
fn test_descriptor_invariants() {
    for bad in [&RESERVED, &SHARED_CODE, &SHARED_NAME, &VOID_PARAM] {
        assert!(
            matches!(bad.validate(), Err(Error::InvalidDescriptor { interface, .. }) if interface == bad.name),
            "{} validated",
            bad.name
        );
    }
}
