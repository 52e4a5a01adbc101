mod common;

use common::{fixtures_dir, load};
use std::fs;
use walkdir::WalkDir;
use xfile::{Severity, Structure, Value, XFile};

fn fixture(name: &str) -> XFile {
    let data = fs::read(fixtures_dir().join(name)).expect("could not read fixture");
    let (result, diagnostics) = load(&data);

    for diagnostic in &diagnostics {
        assert_eq!(diagnostic.severity, Severity::Info, "{}: {}", name, diagnostic);
    }
    result.expect("fixture should load")
}

#[test]
fn every_fixture_loads() {
    let mut count = 0;

    for entry in WalkDir::new(fixtures_dir()) {
        let entry = entry.expect("could not walk fixtures");
        if entry.path().extension().map(|e| e == "x").unwrap_or(false) {
            let file = XFile::from_path(entry.path());
            assert!(file.is_ok(), "{}: {:?}", entry.path().display(), file.err());
            count += 1;
        }
    }

    assert!(count >= 3);
}

#[test]
fn quad() {
    let file = fixture("quad.x");
    let names: Vec<_> = file.structures().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Header", "Material", "Frame"]);

    let material = file.get_by_name("Material").next().unwrap();
    assert_eq!(material.get_float(1), Some(32.0));
    assert_eq!(
        material.find("TextureFilename").next().unwrap().get_str(0),
        Some("textures\\red.png")
    );

    let root_frame = file.get_by_name("Frame").next().unwrap();
    let matrix = root_frame
        .find("FrameTransformMatrix")
        .next()
        .unwrap()
        .get_structure(0)
        .unwrap();
    assert_eq!(matrix.name, "Matrix4x4");
    assert_eq!(matrix.get_float_vec(0).unwrap().len(), 16);

    let mesh = root_frame
        .find("Frame")
        .next()
        .unwrap()
        .find("Mesh")
        .next()
        .unwrap();
    assert_eq!(mesh.get_int(0), Some(4));
    assert_eq!(
        mesh.get_structures(1).unwrap()[3],
        Structure::new(
            "Vector",
            vec![Value::Float(-1.0), Value::Float(1.0), Value::Float(0.0)]
        )
    );
    assert_eq!(mesh.get_int(2), Some(2));
    assert_eq!(
        mesh.get_structures(3).unwrap()[1].get_int_vec(1),
        Some(&[0, 2, 3][..])
    );

    let children: Vec<_> = mesh.children().map(|s| s.name.as_str()).collect();
    assert_eq!(
        children,
        vec!["MeshNormals", "MeshTextureCoords", "MeshMaterialList"]
    );

    let materials = mesh.find("MeshMaterialList").next().unwrap();
    assert_eq!(materials.get_int_vec(2), Some(&[0, 0][..]));
    // `{ Red }` is a reference, not a child.
    assert_eq!(materials.data.len(), 3);
}

#[test]
fn animation() {
    let file = fixture("animation.x");
    let set = file.get_by_name("AnimationSet").next().unwrap();
    let animation = set.find("Animation").next().unwrap();

    let options = animation.find("AnimationOptions").next().unwrap();
    assert_eq!(options.data, vec![Value::Int(1), Value::Int(0)]);

    let key = animation.find("AnimationKey").next().unwrap();
    assert_eq!(key.get_int(1), Some(2));

    let keys = key.get_structures(2).unwrap();
    assert_eq!(keys[1].get_int(0), Some(100));
    assert_eq!(
        keys[1].get_structure(1).unwrap().data,
        vec![Value::Int(3), Value::FloatArray(vec![1.5, 0.0, -2.0])]
    );
}

#[test]
fn skinned_mesh() {
    let data = fs::read(fixtures_dir().join("skinned.x")).unwrap();
    let (result, diagnostics) = load(&data);
    let file = result.unwrap();

    // DeclData is skipped.
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("DeclData"));

    let mesh = file.get_by_name("Mesh").next().unwrap();
    let children: Vec<_> = mesh.children().map(|s| s.name.as_str()).collect();
    assert_eq!(
        children,
        vec!["XSkinMeshHeader", "SkinWeights", "VertexDuplicationIndices"]
    );

    let weights = mesh.find("SkinWeights").next().unwrap();
    assert_eq!(weights.get_str(0), Some("Bone"));
    assert_eq!(weights.get_int_vec(2), Some(&[0, 1, 2][..]));
    assert_eq!(weights.get_float_vec(3), Some(&[1.0, 0.5, 0.25][..]));
    assert_eq!(weights.get_structure(4).unwrap().name, "Matrix4x4");
}
