use std::collections::{BTreeMap, HashMap};

use lz4_pack::{
    decode, decode_as_array, encode, encode_as_array, is_compressed, Envelope, Error, Format,
    SizeClass, Timestamp, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Data {
    a: isize,
    b: i8,
    c: i16,
    d: i32,
    e: i64,
    f: usize,
    g: u8,
    h: u16,
    i: u32,
    j: u64,
    l: f32,
    m: f64,
    n: Vec<String>,
    o: Timestamp,
    p: Vec<char>,
    #[serde(with = "serde_bytes")]
    q: Vec<u8>,
    r: Nested,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Nested {
    name: String,
    tags: BTreeMap<String, Value>,
    maybe: Option<u32>,
}

fn data() -> Data {
    let mut tags = BTreeMap::new();
    tags.insert("count".to_string(), Value::from(3));
    tags.insert("ratio".to_string(), Value::from(0.25f64));
    tags.insert("flag".to_string(), Value::from(true));
    Data {
        a: 4_578_234_323,
        b: i8::MAX,
        c: i16::MAX,
        d: i32::MAX,
        e: i64::MAX,
        f: usize::MAX,
        g: u8::MAX,
        h: u16::MAX,
        i: u32::MAX,
        j: u64::MAX,
        l: f32::MAX,
        m: f64::MAX,
        n: vec!["Hello World".to_string(); 5],
        o: Timestamp::from_utc(946_624_027, 77_777).unwrap(),
        p: "Hello World".chars().collect(),
        q: b"Hello World".to_vec(),
        r: Nested {
            name: "inner".to_string(),
            tags,
            maybe: None,
        },
    }
}

#[test]
fn struct_roundtrip() {
    type Encoder = fn(&Data) -> lz4_pack::Result<Vec<u8>>;
    type Decoder = fn(&[u8]) -> lz4_pack::Result<Data>;
    let cases: [(&str, Encoder, Decoder); 2] = [
        ("named", |v| encode(v), |b| decode(b)),
        ("positional", |v| encode_as_array(v), |b| decode_as_array(b)),
    ];
    let data = data();
    for (name, encoder, decoder) in cases {
        let enc = encoder(&data).unwrap();
        println!("{}: {} bytes", name, enc.len());
        assert!(is_compressed(&enc), "{} wasn't enveloped", name);
        let dec = decoder(&enc).unwrap();
        assert_eq!(dec, data, "{} didn't round-trip", name);
    }
}

#[test]
fn extremes_roundtrip() {
    let mins = (i8::MIN, i16::MIN, i32::MIN, i64::MIN, f32::MIN, f64::MIN);
    let enc = encode(&mins).unwrap();
    assert_eq!(decode::<(i8, i16, i32, i64, f32, f64)>(&enc).unwrap(), mins);

    let zeros = (0u8, 0u16, 0u32, 0u64, 0.0f32, -0.0f64);
    let enc = encode_as_array(&zeros).unwrap();
    let dec: (u8, u16, u32, u64, f32, f64) = decode_as_array(&enc).unwrap();
    assert_eq!(dec, zeros);
    assert!(dec.5.is_sign_negative());
}

#[test]
fn basic_values() {
    let enc = encode(&"hello world").unwrap();
    assert_eq!(decode::<String>(&enc).unwrap(), "hello world");

    let enc = encode(&42).unwrap();
    assert_eq!(decode::<i32>(&enc).unwrap(), 42);

    let enc = encode(&vec!["a", "b", "c"]).unwrap();
    assert_eq!(decode::<Vec<String>>(&enc).unwrap(), vec!["a", "b", "c"]);

    let map: HashMap<String, i32> = [("key1".to_string(), 1), ("key2".to_string(), 2)]
        .into_iter()
        .collect();
    let enc = encode(&map).unwrap();
    assert_eq!(decode::<HashMap<String, i32>>(&enc).unwrap(), map);

    let mut person = BTreeMap::new();
    person.insert("Name".to_string(), Value::from("John"));
    person.insert("Age".to_string(), Value::from(30));
    let enc = encode(&person).unwrap();
    assert_eq!(decode::<BTreeMap<String, Value>>(&enc).unwrap(), person);

    let enc = encode(&Option::<u8>::None).unwrap();
    assert_eq!(decode::<Value>(&enc).unwrap(), Value::Null);

    let enc = encode(&"").unwrap();
    assert_eq!(decode::<String>(&enc).unwrap(), "");

    let enc = encode(&Vec::<String>::new()).unwrap();
    assert!(decode::<Vec<String>>(&enc).unwrap().is_empty());

    let large = serde_bytes::ByteBuf::from(vec![0u8; 10000]);
    let enc = encode(&large).unwrap();
    assert!(enc.len() < 10000);
    assert_eq!(decode::<serde_bytes::ByteBuf>(&enc).unwrap(), large);

    let enc = encode(&true).unwrap();
    assert!(decode::<bool>(&enc).unwrap());
}

#[test]
fn compression_effective() {
    let large =
        vec!["This is a repeated string that should compress well with LZ4".to_string(); 1000];
    let compressed = encode(&large).unwrap();
    let plain = rmp_serde::to_vec_named(&large).unwrap();
    println!(
        "compressed={}, uncompressed={}, ratio={:.2}%",
        compressed.len(),
        plain.len(),
        compressed.len() as f64 / plain.len() as f64 * 100.0
    );
    assert!(compressed.len() < plain.len());
    assert_eq!(decode::<Vec<String>>(&compressed).unwrap(), large);
}

#[test]
fn plain_msgpack_fallback() {
    let data = data();
    let plain = rmp_serde::to_vec_named(&data).unwrap();
    assert!(!is_compressed(&plain));
    assert_eq!(decode::<Data>(&plain).unwrap(), data);

    let plain = rmp_serde::to_vec(&data).unwrap();
    assert_eq!(decode_as_array::<Data>(&plain).unwrap(), data);

    // Plain buffers opening with bytes near the ext opcodes: bin32 (0xc6) and float32 (0xca)
    let bin = serde_bytes::ByteBuf::from(vec![9u8; 70000]);
    let plain = rmp_serde::to_vec(&bin).unwrap();
    assert_eq!(plain[0], 0xc6);
    assert_eq!(decode::<serde_bytes::ByteBuf>(&plain).unwrap(), bin);
    let plain = rmp_serde::to_vec(&1.5f32).unwrap();
    assert_eq!(plain[0], 0xca);
    assert_eq!(decode::<f32>(&plain).unwrap(), 1.5);
}

fn lz4_block(plain: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; lz4::block::compress_bound(plain.len()).unwrap()];
    let len = lz4::block::compress_to_buffer(
        plain,
        Some(lz4::block::CompressionMode::HIGHCOMPRESSION(9)),
        false,
        &mut out,
    )
    .unwrap();
    out.truncate(len);
    out
}

#[test]
fn ext_framing_equivalence() {
    let data = "qwertyuioppasdfghjkl;'zxcvbnm,./";
    let plain = rmp_serde::to_vec(&data).unwrap();
    let block = lz4_block(&plain);

    // Hand-built envelopes, one per size class
    let body = (6 + block.len()) as u32;
    let mut ext8 = vec![0xc7, body as u8, 99, 0xd2];
    ext8.extend_from_slice(&(plain.len() as u32).to_be_bytes());
    ext8.extend_from_slice(&block);

    let mut ext16 = vec![0xc8];
    ext16.extend_from_slice(&(body as u16).to_be_bytes());
    ext16.extend_from_slice(&[99, 0xd2]);
    ext16.extend_from_slice(&(plain.len() as u32).to_be_bytes());
    ext16.extend_from_slice(&block);

    let mut ext32 = vec![0xc9];
    ext32.extend_from_slice(&body.to_be_bytes());
    ext32.extend_from_slice(&[99, 0xd2]);
    ext32.extend_from_slice(&(plain.len() as u32).to_be_bytes());
    ext32.extend_from_slice(&block);

    for (name, buf) in [("ext8", &ext8), ("ext16", &ext16), ("ext32", &ext32)] {
        let dec: String = decode(buf).unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert_eq!(dec, data, "{}", name);
    }

    // Same bytes come out of the envelope builder
    for (class, buf) in [
        (SizeClass::Ext8, &ext8),
        (SizeClass::Ext16, &ext16),
        (SizeClass::Ext32, &ext32),
    ] {
        let built = Envelope::with_size_class(class, Format::Lz4Block, plain.len(), &block)
            .unwrap()
            .as_vec();
        assert_eq!(&built, buf);
    }
}

#[test]
fn tag_minimality_boundaries() {
    for (compressed_len, class) in [
        (249, SizeClass::Ext8),
        (250, SizeClass::Ext16),
        (255, SizeClass::Ext16),
        (256, SizeClass::Ext16),
        (65529, SizeClass::Ext16),
        (65530, SizeClass::Ext32),
        (65535, SizeClass::Ext32),
    ] {
        let block = vec![0u8; compressed_len];
        let env = Envelope::new(Format::Lz4Block, 1, &block).unwrap();
        assert_eq!(env.size_class(), class, "compressed length {}", compressed_len);
    }
}

#[test]
fn corrupt_original_length() {
    let data = vec!["Hello World".to_string(); 50];
    let enc = encode(&data).unwrap();
    let env = Envelope::split(&enc).unwrap().unwrap();
    let len_offset = 1 + env.size_class().field_len() + 2;
    for i in 0..4 {
        for mask in [0x01u8, 0x80, 0xff] {
            let mut bad = enc.clone();
            bad[len_offset + i] ^= mask;
            let result = decode::<Vec<String>>(&bad);
            assert!(
                matches!(
                    result,
                    Err(Error::FailDecompress(_)) | Err(Error::LengthTooLong { .. })
                ),
                "byte {} mask {:#x} gave {:?}",
                i,
                mask,
                result
            );
        }
    }
}

#[test]
fn truncated_envelope() {
    let data = vec!["Hello World".to_string(); 50];
    let enc = encode(&data).unwrap();
    for len in 1..enc.len() {
        assert!(
            decode::<Vec<String>>(&enc[..len]).is_err(),
            "truncated to {} bytes still decoded",
            len
        );
    }
}

#[test]
fn truncated_block_consistent_size() {
    // Drop the last compressed byte but keep the declared size consistent with it
    let data = vec!["Hello World".to_string(); 50];
    let enc = encode(&data).unwrap();
    let env = Envelope::split(&enc).unwrap().unwrap();
    let short = &env.compressed()[..env.compressed().len() - 1];
    let rebuilt = Envelope::new(env.format(), env.original_len(), short)
        .unwrap()
        .as_vec();
    assert!(matches!(
        decode::<Vec<String>>(&rebuilt),
        Err(Error::FailDecompress(_))
    ));
}

#[test]
fn foreign_extension_rejected() {
    // An ext8 value of some other type is not mistaken for plain data once the opcode matches
    let foreign = [0xc7, 6, 42, 0xd2, 0, 0, 0, 0];
    assert!(matches!(
        decode::<Value>(&foreign),
        Err(Error::UnknownExtType(42))
    ));
    // Too small to hold the envelope header, so the ext type is never looked at
    let tiny = [0xc7, 3, 42, 1, 2, 3];
    assert!(matches!(decode::<Value>(&tiny), Err(Error::BadEnvelope(_))));
    let mut enc = encode(&"abc").unwrap();
    enc[3] = 0x00;
    assert!(matches!(decode::<String>(&enc), Err(Error::UnknownFormat(0))));
}

#[test]
fn parallel_calls() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let data = vec![format!("thread {}", i); 100 + i];
                let enc = encode(&data).unwrap();
                let dec: Vec<String> = decode(&enc).unwrap();
                assert_eq!(dec, data);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
