use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use datans::error::{InterceptError, ResolveError, StoreError};
use datans::intercept::IoTable;
use datans::models::{Container, DataKind, Node, Package, SymbolicPath};
use datans::resolve::{Module, Resolution, Resolver};
use datans::store::{DirStore, PackageStore};
use speculate2::speculate;
use tempfile::TempDir;

const DEMO: &str = r#"{"type": "ROOT", "children": {
    "prices": {"type": "TABLE", "hashes": ["ab12"], "format": "csv"},
    "meta": {"type": "GROUP", "children": {
        "notes": {"type": "FILE", "hashes": ["cd34"]}}}}}"#;

fn write_package(root: &Path, owner: &str, name: &str, json: &str) {
    let dir = root.join(owner);
    fs::create_dir_all(&dir).expect("Failed to create owner dir");
    fs::write(dir.join(format!("{}.json", name)), json).expect("Failed to write descriptor");
}

fn write_object(root: &Path, hash: &str, bytes: &[u8]) {
    let dir = root.join(".objs");
    fs::create_dir_all(&dir).expect("Failed to create object dir");
    fs::write(dir.join(hash), bytes).expect("Failed to write object");
}

/// Store with owner `acme`, package `demo`, and an empty owner `empty`.
fn demo_store() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create store dir");
    write_package(dir.path(), "acme", "demo", DEMO);
    fs::create_dir_all(dir.path().join("empty")).expect("Failed to create owner dir");
    dir
}

fn resolver_for(dir: &TempDir) -> Resolver<DirStore> {
    let store = DirStore::new(vec![dir.path().to_path_buf()]);
    Resolver::new(store, "root").expect("Failed to create resolver")
}

/// Wraps a store and counts package lookups.
struct CountingStore {
    inner: DirStore,
    finds: Cell<usize>,
}

impl PackageStore for CountingStore {
    fn store_roots(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.inner.store_roots()
    }

    fn owner_dir_exists(&self, root: &Path, owner: &str) -> bool {
        self.inner.owner_dir_exists(root, owner)
    }

    fn find_package(&self, owner: &str, name: &str) -> Result<Option<Package>, StoreError> {
        self.finds.set(self.finds.get() + 1);
        self.inner.find_package(owner, name)
    }
}

speculate! {
    before {
        let dir = demo_store();
        let resolver = resolver_for(&dir);
    }

    describe "find" {
        it "is not applicable outside the root prefix" {
            let result = resolver.find("other.acme.demo", None).expect("find failed");
            assert!(matches!(result, Resolution::NotApplicable));
        }

        it "is not applicable for the root itself" {
            let result = resolver.find("root", None).expect("find failed");
            assert!(!result.is_applicable());
        }

        it "is not applicable for malformed names" {
            assert!(!resolver.find("", None).expect("find failed").is_applicable());
            assert!(!resolver.find("root..acme", None).expect("find failed").is_applicable());
            assert!(!resolver.find("root.acme.de-mo", None).expect("find failed").is_applicable());
        }

        it "resolves an owner to a placeholder at its directory" {
            match resolver.find("root.acme", None).expect("find failed") {
                Resolution::Owner(loader) => assert_eq!(loader.location(), dir.path().join("acme")),
                other => panic!("expected owner, got {:?}", other),
            }
        }

        it "is not applicable for an unknown owner" {
            let result = resolver.find("root.unknown_owner", None).expect("find failed");
            assert!(!result.is_applicable());
        }

        it "resolves a package to a loader bound to its descriptor" {
            let hint = [PathBuf::from("/ignored")];
            match resolver.find("root.acme.demo", Some(&hint[..])).expect("find failed") {
                Resolution::Package(loader) => {
                    assert_eq!(loader.location(), dir.path().join("acme").join("demo.json"));
                    assert_eq!(loader.package().full_name(), "acme.demo");
                }
                other => panic!("expected package, got {:?}", other),
            }
        }

        it "is not applicable for a missing package" {
            let result = resolver.find("root.acme.missing", None).expect("find failed");
            assert!(!result.is_applicable());
        }

        it "leaves deeper names to the package tree" {
            let result = resolver.find("root.acme.demo.prices", None).expect("find failed");
            assert!(!result.is_applicable());
        }

        it "searches every store root for owners" {
            let other = tempfile::tempdir().expect("Failed to create store dir");
            fs::create_dir_all(other.path().join("zeta")).expect("Failed to create owner dir");
            let store = DirStore::new(vec![dir.path().to_path_buf(), other.path().to_path_buf()]);
            let resolver = Resolver::new(store, "root").expect("Failed to create resolver");

            match resolver.find("root.zeta", None).expect("find failed") {
                Resolution::Owner(loader) => assert_eq!(loader.location(), other.path().join("zeta")),
                other => panic!("expected owner, got {:?}", other),
            }
        }

        it "accepts a structured path" {
            let path = SymbolicPath::from_segments(["acme", "demo"]).expect("invalid path");
            assert!(matches!(resolver.find_path(&path).expect("find failed"), Resolution::Package(_)));
        }

        it "reports an unreadable descriptor as an error" {
            write_package(dir.path(), "acme", "broken", "{");
            let err = resolver.find("root.acme.broken", None).unwrap_err();
            assert!(matches!(err, ResolveError::Store(StoreError::Parse { .. })));
        }

        it "supports a multi-segment root prefix" {
            let store = DirStore::new(vec![dir.path().to_path_buf()]);
            let resolver = Resolver::new(store, "datans.data").expect("Failed to create resolver");
            assert!(resolver.find("datans.data.acme.demo", None).expect("find failed").is_applicable());
            assert!(!resolver.find("datans.acme.demo", None).expect("find failed").is_applicable());
        }
    }

    describe "import" {
        it "materializes the package tree" {
            let module = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            let package = module.as_package().expect("not a package");

            assert_eq!(package.keys(), ["meta", "prices"]);
            let prices = package.child("prices").expect("no prices");
            assert!(prices.is_leaf());
            assert_eq!(
                prices.as_data().map(|d| d.kind().clone()),
                Some(DataKind::Table { format: Some("csv".into()) })
            );
            let meta = package.child("meta").expect("no meta");
            assert!(!meta.is_leaf());
            assert!(meta.child("notes").is_some_and(Node::is_leaf));
        }

        it "returns the identical instance on repeat" {
            let first = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            let second = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            assert!(first.same_instance(&second));
            assert!(Arc::ptr_eq(
                first.as_package().expect("not a package"),
                second.as_package().expect("not a package"),
            ));
        }

        it "does not consult the store for cached names" {
            let store = CountingStore {
                inner: DirStore::new(vec![dir.path().to_path_buf()]),
                finds: Cell::new(0),
            };
            let resolver = Resolver::new(store, "root").expect("Failed to create resolver");

            resolver.import("root.acme.demo").expect("import failed");
            resolver.import("root.acme.demo").expect("import failed");
            assert_eq!(resolver.store().finds.get(), 1);
        }

        it "keeps serving the cached tree after the descriptor changes" {
            let first = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            write_package(dir.path(), "acme", "demo", r#"{"type": "ROOT"}"#);
            let second = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            assert!(first.same_instance(&second));
            assert_eq!(second.as_package().expect("not a package").children().len(), 2);
        }

        it "caches owner placeholders" {
            let first = resolver.import("root.empty").expect("import failed").expect("not found");
            let namespace = first.as_namespace().expect("not a namespace");
            assert_eq!(namespace.name, "root.empty");
            assert_eq!(namespace.location, dir.path().join("empty"));

            let second = resolver.import("root.empty").expect("import failed").expect("not found");
            assert!(first.same_instance(&second));
            assert!(resolver.cache().contains("root.empty"));
        }

        it "caches the parent owner alongside the package" {
            resolver.import("root.acme.demo").expect("import failed");
            assert_eq!(resolver.cache().names(), ["root.acme", "root.acme.demo"]);
        }

        it "returns None for names it does not own" {
            assert!(resolver.import("root.acme.missing").expect("import failed").is_none());
            assert!(resolver.import("root.unknown_owner").expect("import failed").is_none());
            assert!(resolver.import("elsewhere.acme.demo").expect("import failed").is_none());
            assert!(resolver.cache().names().iter().all(|n| n == "root.acme"));
        }

        it "walks into the package for deeper names" {
            let module = resolver.import("root.acme.demo.meta.notes").expect("import failed").expect("not found");
            let member = module.as_member().expect("not a member");
            assert_eq!(member.path(), ["meta", "notes"]);
            assert!(member.node().is_some_and(Node::is_leaf));

            let package = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            assert!(Arc::ptr_eq(member.package(), package.as_package().expect("not a package")));
            assert!(!resolver.cache().contains("root.acme.demo.meta.notes"));
        }

        it "fails for a missing member of an existing package" {
            let err = resolver.import("root.acme.demo.meta.missing").unwrap_err();
            match err {
                ResolveError::MemberNotFound { package, name } => {
                    assert_eq!(package, "root.acme.demo");
                    assert_eq!(name, "meta.missing");
                }
                other => panic!("expected MemberNotFound, got {:?}", other),
            }
        }

        it "aborts on an unexpected node kind and caches nothing" {
            write_package(dir.path(), "acme", "odd", r#"{"type": "ROOT", "children": {"x": {"type": "VIEW"}}}"#);
            let err = resolver.import("root.acme.odd").unwrap_err();
            assert!(matches!(err, ResolveError::UnexpectedNode { .. }));
            assert!(!resolver.cache().contains("root.acme.odd"));
        }

        it "materializes a nested root as a package subtree" {
            write_package(dir.path(), "acme", "bundle", r#"{"type": "ROOT", "children": {
                "sub": {"type": "ROOT", "children": {
                    "t": {"type": "TABLE", "hashes": ["ef56"], "format": "csv"}}}}}"#);
            let module = resolver.import("root.acme.bundle").expect("import failed").expect("not found");
            let package = module.as_package().expect("not a package");

            let sub = package.child("sub").expect("no sub");
            assert!(matches!(sub, Node::Package(_)));
            assert!(sub.child("t").is_some_and(Node::is_leaf));

            let member = resolver.import("root.acme.bundle.sub.t").expect("import failed").expect("not found");
            assert!(member.as_member().and_then(|m| m.node()).is_some_and(Node::is_leaf));
        }

        it "opens leaf data through the io table" {
            write_object(dir.path(), "ab12", b"date,price\n2024-01-01,10\n");
            let module = resolver.import("root.acme.demo.prices").expect("import failed").expect("not found");
            let data = module.as_member().and_then(|m| m.node()).and_then(Node::as_data).expect("not data");
            assert_eq!(data.data_paths(), vec![dir.path().join(".objs").join("ab12")]);

            let mut file = data.open(resolver.io()).expect("open failed");
            let mut content = String::new();
            std::io::Read::read_to_string(&mut file, &mut content).expect("read failed");
            assert!(content.starts_with("date,price"));
        }
    }

    describe "virtual file-system mode" {
        it "strips the marker and resolves the package" {
            let result = resolver.find("root.vfs__acme.demo", None).expect("find failed");
            assert!(matches!(result, Resolution::Package(_)));
        }

        it "activates the fixed opener list" {
            resolver.find("root.vfs__acme", None).expect("find failed");
            for (module, function) in datans::intercept::VFS_OPENERS {
                assert!(resolver.io().is_active(module, function).expect("unknown opener"));
            }
        }

        it "does not activate anything for plain names" {
            resolver.find("root.acme.demo", None).expect("find failed");
            assert!(!resolver.io().is_active("io", "open").expect("unknown opener"));
        }

        it "tolerates repeated activation" {
            resolver.find("root.vfs__acme", None).expect("find failed");
            resolver.find("root.vfs__acme.demo", None).expect("find failed");
            resolver.import("root.vfs__acme.demo").expect("import failed").expect("not found");

            write_object(dir.path(), "cd34", b"hello");
            let path = dir.path().join(".objs").join("cd34");
            resolver.io().open(&path).expect("open failed");
            resolver.io().open(&path).expect("open failed");
            assert_eq!(resolver.io().intercepted().len(), 1);
        }

        it "caches marked and plain names separately" {
            let plain = resolver.import("root.acme.demo").expect("import failed").expect("not found");
            let marked = resolver.import("root.vfs__acme.demo").expect("import failed").expect("not found");
            assert!(!plain.same_instance(&marked));
        }

        it "fails when an opener is missing from the io table" {
            let io = Arc::new(IoTable::new());
            let store = DirStore::new(vec![dir.path().to_path_buf()]);
            let resolver = Resolver::new(store, "root").expect("Failed to create resolver").with_io(io);

            let err = resolver.find("root.vfs__acme.demo", None).unwrap_err();
            assert!(matches!(err, ResolveError::Intercept(InterceptError::UnknownModule(_))));
            assert!(resolver.cache().is_empty());
        }

        it "is not applicable for a bare marker" {
            let result = resolver.find("root.vfs__", None).expect("find failed");
            assert!(!result.is_applicable());
        }
    }

    describe "config" {
        it "rejects an invalid root prefix" {
            let store = DirStore::new(vec![dir.path().to_path_buf()]);
            let err = Resolver::new(store, "bad..root").unwrap_err();
            assert!(matches!(err, ResolveError::InvalidRoot(_)));
        }
    }
}

#[test]
fn module_identity_distinguishes_kinds() {
    let dir = demo_store();
    let resolver = resolver_for(&dir);
    let owner = resolver.import("root.acme").expect("import failed").expect("not found");
    let package = resolver.import("root.acme.demo").expect("import failed").expect("not found");
    assert!(!owner.same_instance(&package));
    assert!(matches!(owner, Module::Namespace(_)));
}
