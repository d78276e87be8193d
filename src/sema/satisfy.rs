// src/sema/satisfy.rs
//! The type-satisfaction predicate.
//!
//! Implements the subject language's published method-set rules: the
//! value method set of a named type holds its value-receiver methods
//! (plus promoted methods of embedded fields), the pointer method set
//! holds all methods, and an interface's method set is its explicit
//! methods plus those of transitively embedded interfaces. Results are
//! memoized per `(type, pointerness, interface)` triple.

use crate::sema::check::{IfaceMethod, NamedTypeDef, PackageInfo, Underlying};
use crate::sema::types::{FuncTy, NamedRef, Ty};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// The loaded universe: checked packages keyed by import path.
pub struct Universe<'a> {
    packages: FxHashMap<&'a str, &'a PackageInfo>,
}

impl<'a> Universe<'a> {
    pub fn new(packages: impl IntoIterator<Item = (&'a str, &'a PackageInfo)>) -> Self {
        Self {
            packages: packages.into_iter().collect(),
        }
    }

    pub fn package(&self, path: &str) -> Option<&'a PackageInfo> {
        self.packages.get(path).copied()
    }

    pub fn named(&self, named: &NamedRef) -> Option<&'a NamedTypeDef> {
        self.package(&named.pkg)?.named_types.get(&named.name)
    }
}

/// Satisfaction context with memoization.
pub struct SatisfyCtx<'a> {
    universe: &'a Universe<'a>,
    implements_cache: RefCell<FxHashMap<(NamedRef, bool, NamedRef), bool>>,
    iface_sets: RefCell<FxHashMap<NamedRef, Option<Rc<Vec<IfaceMethod>>>>>,
}

impl<'a> SatisfyCtx<'a> {
    pub fn new(universe: &'a Universe<'a>) -> Self {
        Self {
            universe,
            implements_cache: RefCell::new(FxHashMap::default()),
            iface_sets: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn universe(&self) -> &'a Universe<'a> {
        self.universe
    }

    /// Whether the named type (or its pointer form when `ptr`) satisfies
    /// the named interface.
    pub fn implements(&self, ty: &NamedRef, ptr: bool, iface: &NamedRef) -> bool {
        let key = (ty.clone(), ptr, iface.clone());
        if let Some(&cached) = self.implements_cache.borrow().get(&key) {
            return cached;
        }
        let result = self.implements_uncached(ty, ptr, iface);
        self.implements_cache.borrow_mut().insert(key, result);
        result
    }

    fn implements_uncached(&self, ty: &NamedRef, ptr: bool, iface: &NamedRef) -> bool {
        let Some(def) = self.universe.named(ty) else {
            return false;
        };
        if def.has_type_params || self.is_interface_like(ty) {
            return false;
        }
        let Some(required) = self.interface_method_set(iface) else {
            return false;
        };
        if required.is_empty() {
            return true;
        }
        let available = self.method_set(ty, ptr);
        required.iter().all(|req| {
            available
                .get(&req.name)
                .map(|sig| *sig == req.sig)
                .unwrap_or(false)
        })
    }

    /// Whether a named type resolves (through defined-type chains) to an
    /// interface. Such types are abstractions, not satisfiers.
    pub fn is_interface_like(&self, named: &NamedRef) -> bool {
        let mut current = named.clone();
        let mut seen = FxHashSet::default();
        while seen.insert(current.clone()) {
            let Some(def) = self.universe.named(&current) else {
                return false;
            };
            match &def.underlying {
                Underlying::Interface(_) => return true,
                Underlying::Other(Ty::Named(next)) => current = next.clone(),
                Underlying::Other(Ty::Interface { .. }) => return true,
                _ => return false,
            }
        }
        // A definition cycle is malformed input; treat it as opaque.
        false
    }

    /// Full method set of an interface, embeds resolved transitively.
    /// `None` when the closure is incomplete: an embed that is not a
    /// loadable interface (constraint elements, or interfaces defined
    /// outside the loaded universe).
    pub fn interface_method_set(&self, iface: &NamedRef) -> Option<Rc<Vec<IfaceMethod>>> {
        if let Some(cached) = self.iface_sets.borrow().get(iface) {
            return cached.clone();
        }
        let mut visiting = FxHashSet::default();
        let result = self.iface_set_inner(iface, &mut visiting).map(Rc::new);
        self.iface_sets
            .borrow_mut()
            .insert(iface.clone(), result.clone());
        result
    }

    fn iface_set_inner(
        &self,
        iface: &NamedRef,
        visiting: &mut FxHashSet<NamedRef>,
    ) -> Option<Vec<IfaceMethod>> {
        if !visiting.insert(iface.clone()) {
            // Embedding cycle; the set contributed by the cycle is empty.
            return Some(Vec::new());
        }
        let def = self.universe.named(iface)?;
        let shape = match &def.underlying {
            Underlying::Interface(shape) => shape,
            Underlying::Other(Ty::Named(next)) => {
                let next = next.clone();
                return self.iface_set_inner(&next, visiting);
            }
            _ => return None,
        };
        if shape.has_constraints {
            return None;
        }
        let mut methods: FxHashMap<String, FuncTy> = FxHashMap::default();
        let mut ordered: Vec<IfaceMethod> = Vec::new();
        for method in &shape.methods {
            if methods
                .insert(method.name.clone(), method.sig.clone())
                .is_none()
            {
                ordered.push(method.clone());
            }
        }
        for embed in &shape.embeds {
            let embedded = match embed {
                Ty::Named(named) => self.iface_set_inner(named, visiting)?,
                Ty::Basic("error") => vec![error_method()],
                Ty::Basic("any") => Vec::new(),
                _ => {
                    warn!(
                        iface = %format!("{}.{}", iface.pkg, iface.name),
                        embed = %embed.display_qualified(),
                        "interface embeds a non-interface element; method set incomplete"
                    );
                    return None;
                }
            };
            for method in embedded {
                if methods
                    .insert(method.name.clone(), method.sig.clone())
                    .is_none()
                {
                    ordered.push(method);
                }
            }
        }
        Some(ordered)
    }

    /// Method set of a named type in value or pointer form, including
    /// methods promoted from embedded fields. Shallower declarations
    /// shadow deeper ones; same-depth duplicates are ambiguous and drop
    /// out of the set.
    pub fn method_set(&self, ty: &NamedRef, ptr: bool) -> FxHashMap<String, FuncTy> {
        let mut set: FxHashMap<String, FuncTy> = FxHashMap::default();
        // (type, include pointer methods)
        let mut level: Vec<(NamedRef, bool)> = vec![(ty.clone(), ptr)];
        let mut seen: FxHashSet<NamedRef> = FxHashSet::default();
        while !level.is_empty() {
            let mut contributions: FxHashMap<String, Vec<FuncTy>> = FxHashMap::default();
            let mut next_level: Vec<(NamedRef, bool)> = Vec::new();
            for (current, addressable) in level.drain(..) {
                if !seen.insert(current.clone()) {
                    continue;
                }
                let Some(def) = self.universe.named(&current) else {
                    continue;
                };
                for method in &def.methods {
                    if method.ptr_recv && !addressable {
                        continue;
                    }
                    contributions
                        .entry(method.name.clone())
                        .or_default()
                        .push(method.sig.clone());
                }
                match &def.underlying {
                    Underlying::Struct(shape) => {
                        for field in &shape.embedded {
                            match field.ty.named_ref() {
                                Some(named) => next_level
                                    .push((named.clone(), addressable || field.is_pointer)),
                                None => {}
                            }
                        }
                    }
                    Underlying::Interface(_) => {
                        // An interface value's methods are all value
                        // methods; reached when an interface is embedded
                        // in a struct.
                        if let Some(methods) = self.interface_method_set(&current) {
                            for method in methods.iter() {
                                contributions
                                    .entry(method.name.clone())
                                    .or_default()
                                    .push(method.sig.clone());
                            }
                        }
                    }
                    Underlying::Other(_) => {}
                }
            }
            for (name, mut sigs) in contributions {
                if set.contains_key(&name) {
                    continue; // shadowed by a shallower method
                }
                if let (1, Some(sig)) = (sigs.len(), sigs.pop()) {
                    set.insert(name, sig);
                }
                // Ambiguous at this depth: excluded from the set.
            }
            level = next_level;
        }
        set
    }
}

fn error_method() -> IfaceMethod {
    IfaceMethod {
        name: "Error".to_string(),
        sig: FuncTy {
            params: Vec::new(),
            variadic: false,
            results: vec![Ty::Basic("string")],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::check::check_package;

    const PKG: &str = "example.com/m/demo";

    fn checked(source: &str) -> PackageInfo {
        let (file, errors) = Parser::parse_file(source, "/tmp/demo.go");
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        check_package(PKG, &[file])
    }

    fn named(name: &str) -> NamedRef {
        NamedRef::new(PKG, name)
    }

    #[test]
    fn value_and_pointer_receiver_rules() {
        let info = checked(
            "package demo\n\
             \n\
             type Doer interface { DoSomething() }\n\
             \n\
             type ConcreteType struct{}\n\
             func (c ConcreteType) DoSomething() {}\n\
             \n\
             type PointerImplementer struct{}\n\
             func (p *PointerImplementer) DoSomething() {}\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);

        assert!(ctx.implements(&named("ConcreteType"), false, &named("Doer")));
        assert!(ctx.implements(&named("ConcreteType"), true, &named("Doer")));
        assert!(!ctx.implements(&named("PointerImplementer"), false, &named("Doer")));
        assert!(ctx.implements(&named("PointerImplementer"), true, &named("Doer")));
    }

    #[test]
    fn empty_interface_is_satisfied_by_concrete_types_only() {
        let info = checked(
            "package demo\n\
             \n\
             type EmptyInterface interface{}\n\
             type Thing struct{}\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);

        assert!(ctx.implements(&named("Thing"), false, &named("EmptyInterface")));
        assert!(ctx.implements(&named("Thing"), true, &named("EmptyInterface")));
        // An abstraction is not a concrete type.
        assert!(!ctx.implements(&named("EmptyInterface"), false, &named("EmptyInterface")));
    }

    #[test]
    fn signature_mismatch_fails() {
        let info = checked(
            "package demo\n\
             \n\
             type Writer interface { Write(p []byte) (int, error) }\n\
             type Sink struct{}\n\
             func (s Sink) Write(p []byte) int { return len(p) }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        assert!(!ctx.implements(&named("Sink"), false, &named("Writer")));
    }

    #[test]
    fn embedded_interface_methods_are_required() {
        let info = checked(
            "package demo\n\
             \n\
             type Closer interface { Close() error }\n\
             type ReadCloser interface {\n\tCloser\n\tRead(p []byte) (int, error)\n}\n\
             \n\
             type File struct{}\n\
             func (f File) Close() error { return nil }\n\
             func (f File) Read(p []byte) (int, error) { return 0, nil }\n\
             \n\
             type HalfFile struct{}\n\
             func (h HalfFile) Read(p []byte) (int, error) { return 0, nil }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        assert!(ctx.implements(&named("File"), false, &named("ReadCloser")));
        assert!(!ctx.implements(&named("HalfFile"), false, &named("ReadCloser")));
    }

    #[test]
    fn promoted_methods_from_embedded_struct() {
        let info = checked(
            "package demo\n\
             \n\
             type Logger interface { Log(msg string) }\n\
             \n\
             type Base struct{}\n\
             func (b Base) Log(msg string) {}\n\
             \n\
             type Service struct {\n\tBase\n}\n\
             \n\
             type PtrService struct {\n\t*Base\n}\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        assert!(ctx.implements(&named("Service"), false, &named("Logger")));
        assert!(ctx.implements(&named("Service"), true, &named("Logger")));
        assert!(ctx.implements(&named("PtrService"), false, &named("Logger")));
    }

    #[test]
    fn pointer_receiver_promotion_needs_addressability() {
        let info = checked(
            "package demo\n\
             \n\
             type Flusher interface { Flush() }\n\
             \n\
             type Buffer struct{}\n\
             func (b *Buffer) Flush() {}\n\
             \n\
             type Wrapper struct {\n\tBuffer\n}\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        // Wrapper's value method set lacks Flush (pointer receiver on an
        // embedded value field), but *Wrapper has it.
        assert!(!ctx.implements(&named("Wrapper"), false, &named("Flusher")));
        assert!(ctx.implements(&named("Wrapper"), true, &named("Flusher")));
    }

    #[test]
    fn unknown_embed_makes_interface_incomplete() {
        let info = checked(
            "package demo\n\
             \n\
             import \"io\"\n\
             \n\
             type Stream interface {\n\tio.Reader\n\tName() string\n}\n\
             type Impl struct{}\n\
             func (i Impl) Name() string { return \"\" }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        // io is not in the loaded universe, so the method set is
        // incomplete and nothing satisfies the interface.
        assert!(ctx.interface_method_set(&named("Stream")).is_none());
        assert!(!ctx.implements(&named("Impl"), false, &named("Stream")));
    }

    #[test]
    fn error_embed_resolves_to_builtin() {
        let info = checked(
            "package demo\n\
             \n\
             type Failer interface {\n\terror\n}\n\
             \n\
             type MyErr struct{}\n\
             func (e MyErr) Error() string { return \"\" }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        assert!(ctx.implements(&named("MyErr"), false, &named("Failer")));
    }

    #[test]
    fn memoization_is_stable() {
        let info = checked(
            "package demo\n\
             type I interface { M() }\n\
             type T struct{}\n\
             func (t T) M() {}\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = SatisfyCtx::new(&universe);
        assert!(ctx.implements(&named("T"), false, &named("I")));
        assert!(ctx.implements(&named("T"), false, &named("I")));
        assert_eq!(ctx.implements_cache.borrow().len(), 1);
    }
}
