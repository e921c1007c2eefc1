use std::{fs, path::Path};

use protowire_compiler::{
    build_collection, resolve_imports, ArtifactKind, Config, DirSink, Error, FsSource, OutputSink,
};

fn write(root: &Path, name: &str, text: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_public_imports_are_transitive() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.proto", "package a; import \"b.proto\"; message A { c.C c = 1; }");
    write(dir.path(), "b.proto", "package b; import public \"c.proto\"; message B {}");
    write(dir.path(), "c.proto", "package c; import \"d.proto\"; message C { d.D d = 1; }");
    write(dir.path(), "d.proto", "package d; message D {}");

    let mut config = Config::new();
    config.include_path(dir.path());
    let collection = build_collection(&config, FsSource::new([dir.path()]), ["a.proto"]).unwrap();
    assert_eq!(collection.files.len(), 4);

    // D reaches C through a plain import, which does not re-export it to A.
    write(dir.path(), "a.proto", "package a; import \"b.proto\"; message A { d.D d = 1; }");
    let err = build_collection(&config, FsSource::new([dir.path()]), ["a.proto"]).unwrap_err();
    match err {
        Error::TypeResolution { name, hint, .. } => {
            assert_eq!(name, "d.D");
            assert!(hint.unwrap().contains("d.proto"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_include_paths_are_searched_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(second.path(), "shared/types.proto", "package shared; message Second {}");
    write(first.path(), "shared/types.proto", "package shared; message First {}");
    write(second.path(), "main.proto", "import \"shared/types.proto\"; message Main { shared.First f = 1; }");

    let source = FsSource::new([first.path(), second.path()]);
    let collection = resolve_imports(&source, ["main.proto", "shared/types.proto"]).unwrap();
    assert_eq!(collection.files.len(), 2);
    assert_eq!(collection.messages[1].full_name, "shared.First");
    assert!(!collection.files[1].imported);
}

#[test]
fn test_missing_import_names_the_importer() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.proto", "syntax = \"proto3\";\nimport \"gone.proto\";\n");

    let err = resolve_imports(FsSource::new([dir.path()]), ["main.proto"]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cannot import \"gone.proto\""), "{}", message);
    assert!(message.contains("main.proto:2:1"), "{}", message);
    assert!(message.contains("file not found in include paths"), "{}", message);
}

#[test]
fn test_compile_into_directory() {
    let protos = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(
        protos.path(),
        "shop.proto",
        "syntax = \"proto3\";
         package shop.v1;
         import \"money.proto\";
         message Order {
             string id = 1;
             repeated Line lines = 2;
             map<string, string> labels = 3;
             message Line { string sku = 1; uint32 quantity = 2; money.Amount price = 3; }
         }",
    );
    write(protos.path(), "money.proto", "syntax = \"proto3\"; package money; message Amount { sint64 cents = 1; }");

    let mut config = Config::new();
    config.include_path(protos.path());
    let artifacts = config.compile(["shop.proto"]).unwrap();
    let mut sink = DirSink::new(out.path());
    sink.write_all(&artifacts).unwrap();

    let shop = fs::read_to_string(out.path().join("shop.v1.rs")).unwrap();
    assert!(shop.contains("pub mod order {"), "{}", shop);
    assert!(shop.contains("pub price: ::core::option::Option<super::super::super::money::Amount>,"), "{}", shop);
    assert!(out.path().join("money.rs").is_file());
    assert!(out.path().join("protowire_runtime.rs").is_file());

    // A second identical compile produces identical bytes.
    let again = config.compile(["shop.proto"]).unwrap();
    assert_eq!(again, artifacts);
    assert_eq!(artifacts.iter().filter(|a| a.kind == ArtifactKind::Runtime).count(), 1);
}
