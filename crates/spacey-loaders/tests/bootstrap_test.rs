//! Bootstrap integration tests
//!
//! Drive the loaders the way the runtime does: a catalog of compiled units,
//! binding providers, and requests coming in from built-in and public code.

use spacey_loaders::{
    BindingProvider, BindingTable, DEFAULT_EXPORT, LEGACY_BINDINGS, LoadKind, LoaderConfig,
    LoaderError, LoaderOptions, Loaders, Manifest, ModuleCatalog, ModuleState, ObjectRef, Value,
};
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

struct Provider {
    calls: Rc<Cell<usize>>,
}

impl BindingProvider for Provider {
    fn get_binding(&self, name: &str) -> spacey_loaders::Result<ObjectRef> {
        self.calls.set(self.calls.get() + 1);
        Ok(ObjectRef::from_entries([("binding", name)]))
    }
}

fn bootstrap(catalog: ModuleCatalog) -> Rc<Loaders> {
    let ids = catalog.ids();
    Loaders::bootstrap(LoaderOptions::new(catalog, ids))
}

#[test]
fn test_legacy_tier_matches_internal_tier() {
    let calls = Rc::new(Cell::new(0));
    let loaders = Loaders::bootstrap(
        LoaderOptions::new(ModuleCatalog::new(), Vec::<String>::new()).with_internal_bindings(
            Provider {
                calls: Rc::clone(&calls),
            },
        ),
    );

    for name in LEGACY_BINDINGS {
        let legacy = loaders.binding(*name).unwrap();
        let internal = loaders.internal_binding(*name).unwrap();
        assert!(legacy.ptr_eq(&internal), "{} resolved twice", name);
    }
    assert_eq!(calls.get(), LEGACY_BINDINGS.len());

    for name in ["module_wrap", "native_module", "errors", "worker"] {
        match loaders.binding(name) {
            Err(LoaderError::NoSuchCapability(n)) => assert_eq!(n, name),
            other => panic!("expected NoSuchCapability for {}, got {:?}", name, other),
        }
    }
    assert_eq!(calls.get(), LEGACY_BINDINGS.len());
}

#[test]
fn test_internal_binding_cached_and_logged_once() {
    let calls = Rc::new(Cell::new(0));
    let loaders = Loaders::bootstrap(
        LoaderOptions::new(ModuleCatalog::new(), Vec::<String>::new()).with_internal_bindings(
            Provider {
                calls: Rc::clone(&calls),
            },
        ),
    );

    let first = loaders.internal_binding("x").unwrap();
    let second = loaders.internal_binding("x").unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(calls.get(), 1);
    assert_eq!(loaders.load_log().count(LoadKind::Binding, "x"), 1);
    assert_eq!(loaders.module_load_list(), vec!["Internal Binding x"]);
}

#[test]
fn test_linked_bindings_are_not_logged() {
    let mut linked = BindingTable::new();
    linked.register_static("embedder", vec![("answer", 42.0)]);
    let loaders = Loaders::bootstrap(
        LoaderOptions::new(ModuleCatalog::new(), Vec::<String>::new()).with_linked_bindings(linked),
    );

    let a = loaders.linked_binding("embedder").unwrap();
    let b = loaders.linked_binding("embedder").unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(a.get_own("answer"), Value::Number(42.0));
    assert!(loaders.load_log().is_empty());
    assert!(matches!(
        loaders.linked_binding("missing"),
        Err(LoaderError::BindingNotFound(_))
    ));
}

#[test]
fn test_self_require_sees_partial_exports() {
    let mut catalog = ModuleCatalog::new();
    catalog.define("cyclic", |exports, require, module, _, _, _| {
        exports.set("before", 1.0);
        assert!(module.is_loading());
        let again = require.call("cyclic")?;
        assert!(again.ptr_eq(exports));
        exports.set("seen", again.get_own("before"));
        Ok(())
    });
    let loaders = bootstrap(catalog);

    let exports = loaders.require("cyclic").unwrap();

    assert_eq!(exports.get_own("seen"), Value::Number(1.0));
    assert_eq!(loaders.module("cyclic").unwrap().state(), ModuleState::Loaded);
    assert_eq!(loaders.module_load_list(), vec!["NativeModule cyclic"]);
}

#[test]
fn test_mutual_cycle_compiles_each_once() {
    let runs = Rc::new(Cell::new(0));
    let mut catalog = ModuleCatalog::new();
    let a_runs = Rc::clone(&runs);
    catalog.define("a", move |exports, require, _, _, _, _| {
        a_runs.set(a_runs.get() + 1);
        exports.set("early", true);
        let b = require.call("b")?;
        exports.set("fromB", b.get_own("value"));
        Ok(())
    });
    let b_runs = Rc::clone(&runs);
    catalog.define("b", move |exports, require, _, _, _, _| {
        b_runs.set(b_runs.get() + 1);
        let a = require.call("a")?;
        exports.set("sawEarly", a.get_own("early"));
        exports.set("sawLate", a.get_own("fromB"));
        exports.set("value", "b");
        Ok(())
    });
    let loaders = bootstrap(catalog);

    let a = loaders.require("a").unwrap();
    let b = loaders.require("b").unwrap();
    loaders.require("a").unwrap();

    assert_eq!(runs.get(), 2);
    assert_eq!(a.get_own("fromB"), Value::from("b"));
    assert_eq!(b.get_own("sawEarly"), Value::Boolean(true));
    assert_eq!(b.get_own("sawLate"), Value::Undefined);
    // b finishes first, so it is logged first.
    assert_eq!(loaders.module_load_list(), vec!["NativeModule b", "NativeModule a"]);
}

#[test]
fn test_missing_module_does_not_register() {
    let loaders = bootstrap(ModuleCatalog::new());

    match loaders.require("nope") {
        Err(LoaderError::MissingModule(id)) => assert_eq!(id, "nope"),
        other => panic!("expected MissingModule, got {:?}", other),
    }
    assert!(!loaders.exists("nope"));
    assert!(loaders.registry().is_empty());
    assert!(loaders.load_log().is_empty());
}

#[test]
fn test_failed_compile_is_retried() {
    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    let mut catalog = ModuleCatalog::new();
    catalog.define("flaky", move |exports, _, _, _, _, _| {
        counter.set(counter.get() + 1);
        exports.set("attempt", counter.get() as f64);
        if counter.get() == 1 {
            return Err(LoaderError::thrown("first attempt fails"));
        }
        Ok(())
    });
    let loaders = bootstrap(catalog);

    let err = loaders.require("flaky").unwrap_err();
    assert_eq!(err.to_string(), "first attempt fails");
    assert_eq!(loaders.module("flaky").unwrap().state(), ModuleState::Unloaded);
    assert!(loaders.load_log().is_empty());

    let exports = loaders.require("flaky").unwrap();
    assert_eq!(attempts.get(), 2);
    assert_eq!(exports.get_own("attempt"), Value::Number(2.0));
    assert_eq!(loaders.load_log().count(LoadKind::Module, "flaky"), 1);
}

#[test]
fn test_compiler_failure_propagates_unchanged() {
    // Registered but the compiler has no unit for it.
    let loaders = Loaders::bootstrap(LoaderOptions::new(ModuleCatalog::new(), ["ghost"]));

    match loaders.require("ghost") {
        Err(LoaderError::UnknownModule(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected UnknownModule, got {:?}", other),
    }
    assert_eq!(loaders.module("ghost").unwrap().state(), ModuleState::Unloaded);
}

#[test]
fn test_public_loader_access_and_expose_internals() {
    let mut catalog = ModuleCatalog::new();
    catalog.define("internal/util", |exports, _, _, _, _, _| {
        exports.set("kEmptyObject", ObjectRef::new());
        Ok(())
    });
    let loaders = bootstrap(catalog);

    match loaders.compile_for_public_loader("internal/util") {
        Err(LoaderError::AccessDenied(id)) => assert_eq!(id, "internal/util"),
        other => panic!("expected AccessDenied, got {:?}", other),
    }
    assert!(loaders.load_log().is_empty());

    loaders.expose_internals();
    let exports = loaders.compile_for_public_loader("internal/util").unwrap();
    assert!(exports.has_own("kEmptyObject"));

    // Internal modules expose no named bindings, only the namespace.
    let module = loaders.module("internal/util").unwrap();
    assert_eq!(module.export_keys(), Some(vec![]));
    let facade = module.facade().unwrap();
    assert_eq!(facade.names(), vec![DEFAULT_EXPORT]);
    assert_eq!(facade.default_export(), Value::Object(exports));
}

#[test]
fn test_loader_cannot_be_exposed() {
    let loaders = Loaders::bootstrap(LoaderOptions::new(
        ModuleCatalog::new(),
        Vec::<String>::new(),
    ));
    loaders.expose_internals();
    assert!(!loaders.can_be_required_by_users("internal/bootstrap/loaders"));
    assert!(matches!(
        loaders.compile_for_public_loader("internal/bootstrap/loaders"),
        Err(LoaderError::AccessDenied(id)) if id == "internal/bootstrap/loaders"
    ));
}

#[test]
fn test_facade_before_public_compile() {
    let mut catalog = ModuleCatalog::new();
    catalog.define("os", |exports, _, _, _, _, _| {
        exports.set("EOL", "\n");
        Ok(())
    });
    let loaders = bootstrap(catalog);

    loaders.require("os").unwrap();
    let module = loaders.module("os").unwrap();
    let facade = module.get_facade().unwrap();
    assert_eq!(facade.names(), vec!["EOL", DEFAULT_EXPORT]);

    let exports = loaders.compile_for_public_loader("os").unwrap();
    assert_eq!(module.export_keys(), Some(vec!["EOL".to_string()]));
    assert!(Rc::ptr_eq(&facade, &module.facade().unwrap()));
    assert_eq!(facade.get_export("EOL"), Some(Value::from("\n")));
    assert_eq!(facade.default_export(), Value::Object(exports));

    // Repeated public compiles stay healthy.
    loaders.compile_for_public_loader("os").unwrap();
}

#[test]
fn test_sync_exports_publishes_writes() {
    let mut catalog = ModuleCatalog::new();
    catalog.define("os", |exports, _, _, _, _, _| {
        exports.set("EOL", "\n");
        exports.set("platform", "linux");
        Ok(())
    });
    let loaders = bootstrap(catalog);

    let exports = loaders.compile_for_public_loader("os").unwrap();
    let module = loaders.module("os").unwrap();
    let facade = module.facade().unwrap();
    assert_eq!(facade.names(), vec!["EOL", "platform", DEFAULT_EXPORT]);
    assert_eq!(facade.get_export("platform"), Some(Value::from("linux")));

    exports.set("platform", "darwin");
    exports.delete("EOL");
    exports.set("late", 1.0);

    // The default binding aliases the exports object.
    let default = facade.default_export();
    assert_eq!(default.as_object().unwrap().get_own("platform"), Value::from("darwin"));
    // Named bindings wait for the next sync.
    assert_eq!(facade.get_export("platform"), Some(Value::from("linux")));

    module.sync_exports().unwrap();
    assert_eq!(facade.get_export("platform"), Some(Value::from("darwin")));
    assert_eq!(facade.get_export("EOL"), Some(Value::Undefined));
    // Names are fixed when the facade is created.
    assert_eq!(facade.get_export("late"), None);

    // A second public compile reuses the snapshot and the facade.
    loaders.compile_for_public_loader("os").unwrap();
    assert!(Rc::ptr_eq(&facade, &module.facade().unwrap()));
    assert_eq!(loaders.load_log().count(LoadKind::Module, "os"), 1);
}

#[test]
fn test_sync_ignores_inherited_properties() {
    let proto = ObjectRef::from_entries([("inherited", "proto")]);
    let mut catalog = ModuleCatalog::new();
    catalog.define("events", move |exports, _, module, _, _, _| {
        exports.set("inherited", "own");
        let replacement = ObjectRef::with_prototype(proto.clone());
        replacement.set("inherited", "own");
        module.set_exports(replacement);
        Ok(())
    });
    let loaders = bootstrap(catalog);

    let exports = loaders.compile_for_public_loader("events").unwrap();
    let facade = loaders.module("events").unwrap().facade().unwrap();
    assert_eq!(facade.get_export("inherited"), Some(Value::from("own")));

    exports.delete("inherited");
    assert_eq!(exports.get("inherited"), Value::from("proto"));
    loaders.module("events").unwrap().sync_exports().unwrap();
    assert_eq!(facade.get_export("inherited"), Some(Value::Undefined));
}

#[test]
fn test_deps_fall_back_to_vendored_namespace() {
    let mut catalog = ModuleCatalog::new();
    catalog.define("internal/deps/acorn", |exports, require, _, _, _, _| {
        let walk = require.call("acorn-walk")?;
        exports.set("walk", walk);
        Ok(())
    });
    catalog.define("internal/deps/acorn-walk", |exports, _, _, _, _, _| {
        exports.set("simple", true);
        Ok(())
    });
    catalog.define("internal/repl", |_, require, _, _, _, _| {
        // Non-dependency modules get no fallback.
        match require.call("acorn-walk") {
            Err(LoaderError::MissingModule(id)) if id == "acorn-walk" => Ok(()),
            other => Err(LoaderError::thrown(format!("unexpected {:?}", other))),
        }
    });
    let loaders = bootstrap(catalog);

    let acorn = loaders.require("internal/deps/acorn").unwrap();
    let walk = acorn.get_own("walk");
    assert_eq!(walk.as_object().unwrap().get_own("simple"), Value::Boolean(true));
    loaders.require("internal/repl").unwrap();
}

#[test]
fn test_units_receive_injected_context() {
    let process = ObjectRef::from_entries([("pid", 7.0)]);
    let primordials = ObjectRef::from_entries([("ObjectKeys", "intrinsic")]);
    let mut bindings = BindingTable::new();
    bindings.register_static("constants", vec![("os", "linux")]);

    let mut catalog = ModuleCatalog::new();
    catalog.define("constants", |exports, require, module, process, internal_binding, primordials| {
        assert_eq!(module.id(), "constants");
        assert_eq!(module.filename(), "constants.js");
        let loaders_exports = require.call("internal/bootstrap/loaders")?;
        exports.set("hasLoaders", loaders_exports.has_own("internalBinding"));
        exports.set("pid", process.get_own("pid"));
        exports.set("intrinsic", primordials.get_own("ObjectKeys"));
        exports.set("os", internal_binding.call("constants")?.get_own("os"));
        Ok(())
    });
    let ids = catalog.ids();
    let loaders = Loaders::bootstrap(
        LoaderOptions::new(catalog, ids)
            .with_internal_bindings(bindings)
            .with_process(process.clone())
            .with_primordials(primordials),
    );

    let exports = loaders.require("constants").unwrap();
    assert_eq!(exports.get_own("hasLoaders"), Value::Boolean(true));
    assert_eq!(exports.get_own("pid"), Value::Number(7.0));
    assert_eq!(exports.get_own("intrinsic"), Value::from("intrinsic"));
    assert_eq!(exports.get_own("os"), Value::from("linux"));
    assert!(loaders.process().ptr_eq(&process));
    // The binding is logged before the module that loaded it finishes.
    assert_eq!(
        loaders.module_load_list(),
        vec!["Internal Binding constants", "NativeModule constants"]
    );
}

#[test]
fn test_manifest_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "config": {{ "expose_internals": true }},
            "bindings": {{ "fs": {{ "kUsePromises": 1 }} }},
            "modules": {{
                "internal/fs/utils": {{ "bindings": ["fs"], "exports": {{ "kMaxUserId": 4294967295 }} }},
                "fs": {{ "requires": ["internal/fs/utils"], "exports": {{ "F_OK": 0 }} }},
                "broken": {{ "throws": "cannot load" }}
            }}
        }}"#
    )
    .unwrap();

    let manifest = Manifest::from_path(file.path()).unwrap();
    let loaders = Loaders::bootstrap(manifest.into_options());

    assert!(loaders.can_be_required_by_users("internal/fs/utils"));
    let fs = loaders.compile_for_public_loader("fs").unwrap();
    assert_eq!(fs.get_own("F_OK"), Value::Number(0.0));
    assert_eq!(
        loaders.module_load_list(),
        vec![
            "Internal Binding fs",
            "NativeModule internal/fs/utils",
            "NativeModule fs"
        ]
    );

    let err = loaders.require("broken").unwrap_err();
    assert_eq!(err.to_string(), "cannot load");
}

#[test]
fn test_custom_allow_list() {
    let config = LoaderConfig {
        legacy_allow_list: Some(vec!["tty_wrap".to_string()]),
        ..Default::default()
    };
    let mut bindings = BindingTable::new();
    bindings.register_static("tty_wrap", vec![("isTTY", false)]);
    bindings.register_static("fs", vec![("kind", "fs")]);
    let loaders = Loaders::bootstrap(
        LoaderOptions::new(ModuleCatalog::new(), Vec::<String>::new())
            .with_config(config)
            .with_internal_bindings(bindings),
    );

    assert!(loaders.binding("tty_wrap").is_ok());
    assert!(matches!(loaders.binding("fs"), Err(LoaderError::NoSuchCapability(_))));
    assert!(loaders.internal_binding("fs").is_ok());
}
