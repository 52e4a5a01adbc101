mod common;

use common::{binary_file, compressed_file, load, load_with, text_file, Tokens};
use xfile::{Structure, TemplateRegistry, Value, XFile};

const QUAD_TEXT: &str = "
Mesh {
 4;
 -1.0;-1.0;0.0;,
 1.0;-1.0;0.0;,
 1.0;1.0;0.5;,
 -1.0;1.0;0.25;;
 2;
 3;0,1,2;,
 3;0,2,3;;
 MeshNormals {
  1;
  0.0;0.0;1.0;;
  2;
  3;0,0,0;,
  3;0,0,0;;
 }
 MeshTextureCoords {
  4;
  0.0;1.0;,
  1.0;1.0;,
  1.0;0.0;,
  0.0;0.0;;
 }
 MeshMaterialList {
  1;
  2;
  0,0;;
  Material {
   1.0;0.5;0.25;1.0;;
   8.0;
   0.0;0.0;0.0;;
   0.0;0.0;0.0;;
   TextureFilename { \"quad.png\"; }
  }
 }
}
";

fn quad_tokens(tokens: Tokens) -> Tokens {
    tokens
        .open("Mesh")
        .ints(&[4])
        .floats(&[
            -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.5, -1.0, 1.0, 0.25,
        ])
        .ints(&[2, 3, 0, 1, 2, 3, 0, 2, 3])
        .open("MeshNormals")
        .ints(&[1])
        .floats(&[0.0, 0.0, 1.0])
        .ints(&[2, 3, 0, 0, 0, 3, 0, 0, 0])
        .close()
        .open("MeshTextureCoords")
        .ints(&[4])
        .floats(&[0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0])
        .close()
        .open("MeshMaterialList")
        .ints(&[1, 2, 0, 0])
        .open("Material")
        .floats(&[1.0, 0.5, 0.25, 1.0, 8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .open("TextureFilename")
        .string("quad.png")
        .close()
        .close()
        .close()
        .close()
}

fn root(data: &[u8]) -> Structure {
    let (result, diagnostics) = load(data);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    result.unwrap().root
}

#[test]
fn text_and_binary_meshes_are_equal() {
    let text = root(&text_file(QUAD_TEXT));
    let binary = root(&binary_file(quad_tokens(Tokens::new())));

    assert_eq!(text, binary);
    assert_eq!(text.get_structure(0).unwrap().children().count(), 3);
}

#[test]
fn double_precision_files_are_equal() {
    let mut text = b"xof 0303txt 0064".to_vec();
    text.extend_from_slice(QUAD_TEXT.as_bytes());

    assert_eq!(root(&text), root(&binary_file(quad_tokens(Tokens::doubles()))));
}

#[test]
fn compressed_files_match_uncompressed_ones() {
    let binary = quad_tokens(Tokens::new()).finish();

    let text_root = root(&text_file(QUAD_TEXT));
    assert_eq!(root(&compressed_file(b"tzip", QUAD_TEXT.as_bytes())), text_root);
    assert_eq!(root(&compressed_file(b"bzip", &binary)), text_root);
}

#[test]
fn empty_mesh_in_both_flavors() {
    let expected = Structure::new(
        "",
        vec![Value::Structure(Structure::new(
            "Mesh",
            vec![
                Value::Int(0),
                Value::StructureArray(vec![]),
                Value::Int(0),
                Value::StructureArray(vec![]),
            ],
        ))],
    );

    assert_eq!(root(&text_file("Mesh { 0;; 0;; }")), expected);
    assert_eq!(
        root(&binary_file(Tokens::new().open("Mesh").int(0).int(0).close())),
        expected
    );
}

#[test]
fn custom_templates_in_both_flavors() {
    let grammar = format!(
        "{}
        template Sample {{
            DWORD id;
            STRING label;
            Vector origin;
            DWORD count;
            array FLOAT weights[count];
            array Coords2d uvs[count];
            array DWORD flags[3];
        }}",
        xfile::parsers::template::STANDARD_TEMPLATES
    );
    let registry = TemplateRegistry::from_grammar(&grammar).unwrap();

    let text = text_file(
        "Sample {
            7;
            \"first\";
            1.0; 2.0; 3.0;;
            2;
            0.5, 0.25;
            0.0; 1.0;, 1.0; 0.0;;
            1, 2, 3;
        }",
    );
    let binary = binary_file(
        Tokens::new()
            .open("Sample")
            .int(7)
            .string("first")
            .floats(&[1.0, 2.0, 3.0])
            .ints(&[2])
            .floats(&[0.5, 0.25, 0.0, 1.0, 1.0, 0.0])
            .ints(&[1, 2, 3])
            .close(),
    );

    let (text_result, _) = load_with(&text, &registry);
    let (binary_result, _) = load_with(&binary, &registry);
    let from_text: XFile = text_result.unwrap();
    let from_binary: XFile = binary_result.unwrap();

    assert_eq!(from_text.root, from_binary.root);

    let sample = from_text.get_by_name("Sample").next().unwrap();
    assert_eq!(sample.get_str(1), Some("first"));
    assert_eq!(sample.get_float_vec(4), Some(&[0.5, 0.25][..]));
    assert_eq!(sample.get_structures(5).unwrap().len(), 2);
    assert_eq!(sample.get_int_vec(6), Some(&[1, 2, 3][..]));
}

#[test]
fn parsing_is_deterministic() {
    let text = text_file(QUAD_TEXT);
    let binary = binary_file(quad_tokens(Tokens::new()));

    assert_eq!(root(&text), root(&text));
    assert_eq!(root(&binary), root(&binary));
}

#[test]
fn registry_is_shared_between_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let (result, _) = load(&text_file(QUAD_TEXT));
                result.unwrap().root
            })
        })
        .collect();

    let roots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(roots.windows(2).all(|pair| pair[0] == pair[1]));
}
