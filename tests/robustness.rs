//! Property-based tests: malformed input must be rejected, never panic.

mod common;

use common::{binary_file, load, text_file, Tokens};
use proptest::prelude::*;

/// Words and punctuation that show up in text .x files
fn text_token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("{".to_string()),
        Just("}".to_string()),
        Just(";".to_string()),
        Just(",".to_string()),
        Just("\"".to_string()),
        Just("//".to_string()),
        Just("\n".to_string()),
        Just("template".to_string()),
        Just("<3D82AB44-62DA-11CF-AB39-0020AF71E433>".to_string()),
        "(Mesh|Frame|Vector|Header|Material|MeshFace|Unknown)",
        "-?[0-9]{1,4}(\\.[0-9]{1,3})?",
        "[a-z]{1,6}",
    ]
}

fn text_document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(text_token_strategy(), 0..60).prop_map(|tokens| tokens.join(" "))
}

/// Token codes with plausible payloads, so the stream gets past the first token more often than random bytes do
fn binary_tokens_strategy() -> impl Strategy<Value = Vec<u8>> {
    let token = prop_oneof![
        "(Mesh|Frame|Vector|Header|Unknown)".prop_map(|name| Tokens::new().open(&name).finish()),
        Just(Tokens::new().close().finish()),
        any::<i32>().prop_map(|v| Tokens::new().int(v).finish()),
        prop::collection::vec(0..8_i32, 0..6).prop_map(|v| Tokens::new().ints(&v).finish()),
        prop::collection::vec(-4.0..4.0_f64, 0..6).prop_map(|v| Tokens::new().floats(&v).finish()),
        "[a-z]{0,8}".prop_map(|s| Tokens::new().string(&s).finish()),
        any::<u16>().prop_map(|code| Tokens::new().code(code).finish()),
    ];
    prop::collection::vec(token, 0..40).prop_map(|tokens| tokens.concat())
}

proptest! {
    #[test]
    fn arbitrary_binary_bytes_never_panic(body in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut data = b"xof 0303bin 0032".to_vec();
        data.extend_from_slice(&body);
        let _ = load(&data);
    }

    #[test]
    fn arbitrary_token_streams_never_panic(body in binary_tokens_strategy()) {
        let mut data = binary_file(Tokens::new());
        data.extend_from_slice(&body);
        let (result, diagnostics) = load(&data);

        if result.is_err() {
            prop_assert!(!diagnostics.is_empty());
        }
    }

    #[test]
    fn arbitrary_text_never_panics(body in text_document_strategy()) {
        let (result, diagnostics) = load(&text_file(&body));

        if result.is_err() {
            prop_assert!(!diagnostics.is_empty());
        }
    }

    #[test]
    fn arbitrary_headers_never_panic(data in prop::collection::vec(any::<u8>(), 0..40)) {
        let _ = load(&data);
    }

    #[test]
    fn loading_twice_gives_the_same_result(body in text_document_strategy()) {
        let data = text_file(&body);
        let (first, first_diagnostics) = load(&data);
        let (second, second_diagnostics) = load(&data);

        // Debug output, since a "nan" word parses to a float that never equals itself
        prop_assert_eq!(format!("{:?}", first.ok()), format!("{:?}", second.ok()));
        prop_assert_eq!(first_diagnostics, second_diagnostics);
    }
}
