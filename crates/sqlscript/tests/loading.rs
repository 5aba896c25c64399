mod common;

use asupersync::{Cx, Outcome};
use asupersync::runtime::RuntimeBuilder;
use common::{cancelled_cx, expect_err, scripts_dir, unwrap_outcome};
use sqlscript::error::ResourceErrorKind;
use sqlscript::{
    EmbeddedResources, Error, KeyComparer, KeyStyle, ResourceContainer, ScriptRegistry,
    TextEncoding, params,
};
use std::borrow::Cow;
use std::sync::Arc;

static EMBEDDED: EmbeddedResources = sqlscript::embedded_resources!("sqlscript-tests";
    "Sqlscript.Tests.Scripts.SqlTest.sql" => "scripts/SqlTest.sql",
    "Sqlscript.Tests.Scripts.SqlTransformTest.sql" => "scripts/SqlTransformTest.sql",
    "Sqlscript.Tests.Other.Ignored.sql" => "scripts/FruitById.sql",
);

#[test]
fn embedded_scripts_load_by_prefix() {
    let scripts = ScriptRegistry::new();
    let loaded = scripts
        .add()
        .from_container(&EMBEDDED, "Sqlscript.Tests.Scripts")
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(&*scripts.get("SqlTest.sql").unwrap(), "select * from [Test]");
    assert_eq!(
        scripts
            .get_with("SqlTransformTest.sql", params! { "TableName" => "Apples" })
            .unwrap(),
        "select * from Apples"
    );
    assert!(!scripts.contains("Ignored.sql"));
}

#[test]
fn directory_scripts_load_with_file_names() {
    let scripts = ScriptRegistry::new();
    let loaded = scripts.add().from_directory(scripts_dir()).unwrap();

    assert_eq!(loaded, 3);
    assert_eq!(
        scripts.keys(),
        vec!["FruitById.sql", "SqlTest.sql", "SqlTransformTest.sql"]
    );
    assert!(!scripts.contains("readme.txt"));
    assert_eq!(&*scripts.get("sqltest.sql").unwrap(), "select * from [Test]");
}

#[test]
fn directory_matches_extension_ignoring_case_and_skips_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Upper.SQL"), "select 1").unwrap();
    std::fs::write(dir.path().join("notes.sql.bak"), "select 2").unwrap();
    std::fs::create_dir(dir.path().join("nested.sql")).unwrap();
    std::fs::write(dir.path().join("nested.sql").join("Inner.sql"), "select 3").unwrap();

    let scripts = ScriptRegistry::new();
    assert_eq!(scripts.add().from_directory(dir.path()).unwrap(), 1);
    assert_eq!(scripts.keys(), vec!["Upper.SQL"]);
}

#[cfg(unix)]
#[test]
fn directory_follows_symlinked_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    std::fs::write(target.path().join("Shared.sql"), "select 'shared'").unwrap();
    std::os::unix::fs::symlink(target.path().join("Shared.sql"), dir.path().join("Linked.sql"))
        .unwrap();
    std::os::unix::fs::symlink(target.path(), dir.path().join("linked_dir.sql")).unwrap();

    let scripts = ScriptRegistry::new();
    assert_eq!(scripts.add().from_directory(dir.path()).unwrap(), 1);
    assert_eq!(&*scripts.get("Linked.sql").unwrap(), "select 'shared'");
}

#[test]
fn file_stem_keys_and_encodings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Wide.sql");
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "select 'ü'".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(&path, bytes).unwrap();

    let scripts = ScriptRegistry::new();
    let key = scripts
        .add()
        .encoding(TextEncoding::Utf16Le)
        .key_style(KeyStyle::FileStem)
        .from_file(&path)
        .unwrap();

    assert_eq!(key, "Wide");
    assert_eq!(&*scripts.get("wide").unwrap(), "select 'ü'");
}

#[test]
fn undecodable_file_reports_resource() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Bad.sql"), [0xC3, 0x28]).unwrap();

    let err = ScriptRegistry::new()
        .add()
        .from_directory(dir.path())
        .unwrap_err();
    match err {
        Error::Resource(e) => {
            assert_eq!(e.kind, ResourceErrorKind::Decode);
            assert_eq!(e.resource, "Bad.sql");
        }
        _ => panic!("unexpected error"),
    }
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ScriptRegistry::new()
        .add()
        .from_directory(dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn later_loads_replace_earlier_scripts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("SqlTest.sql"), "select 'replaced'").unwrap();

    let scripts = ScriptRegistry::new();
    scripts.add().from_directory(scripts_dir()).unwrap();
    scripts.add().from_directory(dir.path()).unwrap();

    assert_eq!(&*scripts.get("SqlTest.sql").unwrap(), "select 'replaced'");
    assert_eq!(scripts.len(), 3);
}

#[test]
fn ordinal_registry_keeps_case_distinct() {
    let scripts = ScriptRegistry::with_comparer(KeyComparer::Ordinal);
    scripts.add().from_directory(scripts_dir()).unwrap();
    assert!(scripts.contains("SqlTest.sql"));
    assert!(scripts.get("sqltest.sql").unwrap_err().is_script_not_found());
}

/// Generates `count` scripts on demand.
struct Generated {
    count: usize,
}

impl ResourceContainer for Generated {
    fn name(&self) -> &str {
        "generated"
    }

    fn resource_names(&self) -> Vec<String> {
        (0..self.count).map(|i| format!("gen.Script{i}.sql")).collect()
    }

    fn open(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let index = name.strip_prefix("gen.Script")?.strip_suffix(".sql")?;
        Some(Cow::Owned(format!("select {index}").into_bytes()))
    }
}

#[test]
fn concurrent_container_load_writes_every_script() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let scripts = ScriptRegistry::new();
        let container = Generated { count: 250 };
        let loaded = unwrap_outcome(
            scripts
                .add()
                .from_container_async(&cx, &container, "gen")
                .await,
        );

        assert_eq!(loaded, 250);
        assert_eq!(scripts.len(), 250);
        assert_eq!(&*scripts.get("script249.sql").unwrap(), "select 249");
    });
}

#[test]
fn async_load_rejects_empty_prefix() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let scripts = ScriptRegistry::new();
        let err = expect_err(scripts.add().from_container_async(&cx, &EMBEDDED, "").await);
        match err {
            Error::InvalidArgument(e) => assert_eq!(e.name, "prefix"),
            _ => panic!("unexpected error"),
        }
        assert!(scripts.is_empty());
    });
}

#[test]
fn cancelled_async_load_writes_nothing() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = cancelled_cx();

    rt.block_on(async {
        let scripts = ScriptRegistry::new();
        let outcome = scripts
            .add()
            .from_container_async(&cx, &Generated { count: 10 }, "gen")
            .await;
        assert!(matches!(outcome, Outcome::Cancelled(_)));
        assert!(scripts.is_empty());
    });
}

#[test]
fn readers_see_scripts_while_loading() {
    let scripts = Arc::new(ScriptRegistry::new());
    scripts.add().from_literal("seed", "select 0").unwrap();

    std::thread::scope(|s| {
        let writer = Arc::clone(&scripts);
        s.spawn(move || {
            writer
                .add()
                .from_container(&Generated { count: 500 }, "gen")
                .unwrap();
        });
        for _ in 0..4 {
            let reader = Arc::clone(&scripts);
            s.spawn(move || {
                for _ in 0..200 {
                    assert_eq!(&*reader.get("SEED").unwrap(), "select 0");
                }
            });
        }
    });

    assert_eq!(scripts.len(), 501);
}
