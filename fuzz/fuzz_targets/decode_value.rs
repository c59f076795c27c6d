#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let codec = lz4_pack::Codec::new().max_decoded_len(1 << 24);
    if let Ok(value) = codec.decode_value(data) {
        // Floats may be NaN, so only check that re-encoding succeeds and decodes again
        let enc = codec.encode_value(&value).unwrap();
        codec.decode_value(&enc).unwrap();
    }
});
