//! Registry entry model.
//!
//! # Responsibilities
//! - Describe how one address is built ([`Source`])
//! - Carry default parameters ([`Params`]) as tagged literal/resolved bindings
//! - Hand sources their arguments in declared order ([`Args`])
//!
//! # Design Decisions
//! - Parameter names are declared up front by each source; nothing is
//!   inferred from constructor signatures
//! - A binding is either `Literal` or `Resolved`, decided when it is written
//! - Instances are type-erased (`Arc<dyn Any + Send + Sync>`) and downcast
//!   at the edges

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::error::{BoxError, ContainerError, ContainerResult};
use crate::container::resolver::Resolver;

/// A built dependency.
pub type Instance = Arc<dyn Any + Send + Sync>;

type BuildFn = dyn Fn(&Resolver<'_>, &Args) -> ContainerResult<Instance> + Send + Sync;
type ParamFn = dyn Fn(&Resolver<'_>) -> ContainerResult<Instance> + Send + Sync;

/// Downcast an instance, naming `subject` in the error.
pub(crate) fn downcast<T: Any + Send + Sync>(subject: &str, instance: Instance) -> ContainerResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            subject: subject.to_string(),
            expected: type_name::<T>(),
        })
}

/// Types the container can build from an ordered argument list.
pub trait Constructible: Any + Send + Sync + Sized {
    /// Formal parameter names, in the order `construct` reads them.
    const PARAMS: &'static [&'static str];

    /// Build an instance from the projected arguments.
    fn construct(args: &Args) -> ContainerResult<Self>;
}

/// How to build the instance behind an address.
#[derive(Clone)]
pub struct Source {
    type_name: &'static str,
    params: Vec<String>,
    build: Arc<BuildFn>,
}

impl Source {
    /// A constructible type.
    pub fn of<T: Constructible>() -> Self {
        Self {
            type_name: type_name::<T>(),
            params: T::PARAMS.iter().map(|name| name.to_string()).collect(),
            build: Arc::new(|_, args| Ok(Arc::new(T::construct(args)?) as Instance)),
        }
    }

    /// A factory closure. It receives the resolution context and the
    /// arguments projected onto `params`.
    pub fn factory<T, F, I, S>(params: I, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolver<'_>, &Args) -> ContainerResult<T> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: type_name::<T>(),
            params: params.into_iter().map(Into::into).collect(),
            build: Arc::new(move |resolver, args| Ok(Arc::new(f(resolver, args)?) as Instance)),
        }
    }

    /// A pre-built value; every construction hands out a fresh clone.
    pub fn value<T: Any + Send + Sync + Clone>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            params: Vec::new(),
            build: Arc::new(move |_, _| Ok(Arc::new(value.clone()) as Instance)),
        }
    }

    /// Name of the type this source produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared parameter names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Build an instance directly, bypassing parameter resolution.
    pub fn instantiate(&self, resolver: &Resolver<'_>, args: &Args) -> ContainerResult<Instance> {
        (self.build)(resolver, args)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("type_name", &self.type_name)
            .field("params", &self.params)
            .finish()
    }
}

/// One parameter binding.
#[derive(Clone)]
pub enum Param {
    /// Passed through as is.
    Literal(Instance),
    /// Computed through the resolution context each time the owner is built.
    Resolved(Arc<ParamFn>),
}

impl Param {
    /// A literal value.
    pub fn literal<T: Any + Send + Sync>(value: T) -> Self {
        Param::Literal(Arc::new(value))
    }

    /// A literal that is already shared.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Param::Literal(value)
    }

    /// A value computed from the resolution context.
    pub fn resolved<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        Param::Resolved(Arc::new(move |resolver| Ok(Arc::new(f(resolver)?) as Instance)))
    }

    /// A resolved binding whose closure already yields an [`Instance`].
    pub fn resolved_instance<F>(f: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> ContainerResult<Instance> + Send + Sync + 'static,
    {
        Param::Resolved(Arc::new(f))
    }

    /// The singleton registered at `address`.
    pub fn invoke(address: impl Into<String>) -> Self {
        let address = address.into();
        Self::resolved_instance(move |resolver| resolver.invoke(&address))
    }

    /// A fresh instance of `address`, built with `params`.
    pub fn make(address: impl Into<String>, params: Params) -> Self {
        let address = address.into();
        Self::resolved_instance(move |resolver| resolver.make(&address, params.clone()))
    }

    /// Whether this binding goes through the resolution context.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Param::Resolved(_))
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Literal(_) => f.write_str("Literal(..)"),
            Param::Resolved(_) => f.write_str("Resolved(..)"),
        }
    }
}

/// Named parameter bindings, in declaration order.
#[derive(Clone, Default, Debug)]
pub struct Params {
    bindings: Vec<(String, Param)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`.
    pub fn with(mut self, name: impl Into<String>, param: Param) -> Self {
        self.bindings.push((name.into(), param));
        self
    }

    pub fn literal<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.with(name, Param::literal(value))
    }

    pub fn shared<T: Any + Send + Sync>(self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.with(name, Param::shared(value))
    }

    pub fn resolved<T, F>(self, name: impl Into<String>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.with(name, Param::resolved(f))
    }

    pub fn invoke(self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.with(name, Param::invoke(address))
    }

    pub fn make(self, name: impl Into<String>, address: impl Into<String>, params: Params) -> Self {
        self.with(name, Param::make(address, params))
    }

    /// Number of bindings, duplicates included.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names in declaration order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    /// Collapse to one binding per name. A later binding of the same kind
    /// replaces an earlier one; mixing kinds under one name is a collision.
    pub(crate) fn flatten(&self, address: &str) -> ContainerResult<Vec<(String, Param)>> {
        let mut flat: Vec<(String, Param)> = Vec::with_capacity(self.bindings.len());
        for (name, param) in &self.bindings {
            match flat.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) if slot.1.is_resolved() != param.is_resolved() => {
                    return Err(ContainerError::ParamKeyCollision {
                        address: address.to_string(),
                        param: name.clone(),
                    });
                }
                Some(slot) => slot.1 = param.clone(),
                None => flat.push((name.clone(), param.clone())),
            }
        }
        Ok(flat)
    }

    /// `self` merged over `defaults`; `self` wins per name.
    pub(crate) fn merged_over(&self, defaults: &Params, address: &str) -> ContainerResult<Vec<(String, Param)>> {
        let mut merged = defaults.flatten(address)?;
        for (name, param) in self.flatten(address)? {
            match merged.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = param,
                None => merged.push((name, param)),
            }
        }
        Ok(merged)
    }
}

/// Resolved arguments, projected onto a source's declared parameter order.
pub struct Args {
    address: String,
    names: Vec<String>,
    values: Vec<Option<Instance>>,
}

impl Args {
    /// Project `resolved` onto `names`. Names without a value become `None`;
    /// values without a declared name are dropped.
    pub fn project(address: &str, names: &[String], mut resolved: HashMap<String, Instance>) -> Self {
        let values = names.iter().map(|name| resolved.remove(name)).collect();
        Self {
            address: address.to_string(),
            names: names.to_vec(),
            values,
        }
    }

    /// Address being built.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Declared parameter names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at a position.
    pub fn at(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Raw value by name.
    pub fn value(&self, name: &str) -> Option<&Instance> {
        let index = self.names.iter().position(|n| n == name)?;
        self.at(index)
    }

    /// Typed value by name; `Ok(None)` when absent.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Option<Arc<T>>> {
        match self.value(name) {
            Some(instance) => downcast::<T>(&format!("{}.{}", self.address, name), Arc::clone(instance)).map(Some),
            None => Ok(None),
        }
    }

    /// Typed value by name; `MissingParam` when absent.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.get::<T>(name)?.ok_or_else(|| ContainerError::MissingParam {
            address: self.address.clone(),
            param: name.to_string(),
        })
    }

    /// Owned copy of a typed value; `Ok(None)` when absent.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, name: &str) -> ContainerResult<Option<T>> {
        Ok(self.get::<T>(name)?.map(|value| T::clone(&value)))
    }

    /// Wrap a source failure for this address.
    pub fn fail(&self, err: impl Into<BoxError>) -> ContainerError {
        ContainerError::Construction {
            address: self.address.clone(),
            source: err.into(),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<(&str, bool)> = self
            .names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.as_str(), value.is_some()))
            .collect();
        f.debug_struct("Args")
            .field("address", &self.address)
            .field("present", &present)
            .finish()
    }
}

/// The registered recipe for one address.
#[derive(Clone, Default, Debug)]
pub struct Entry {
    source: Option<Arc<Source>>,
    params: Params,
}

impl Entry {
    pub fn new(source: Source) -> Self {
        Self {
            source: Some(Arc::new(source)),
            params: Params::new(),
        }
    }

    /// Entry for a constructible type.
    pub fn of<T: Constructible>() -> Self {
        Self::new(Source::of::<T>())
    }

    /// Replace the default parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Add one default binding.
    pub fn param(mut self, name: impl Into<String>, param: Param) -> Self {
        self.params = self.params.with(name, param);
        self
    }

    pub fn source(&self) -> Option<&Arc<Source>> {
        self.source.as_ref()
    }

    pub fn default_params(&self) -> &Params {
        &self.params
    }

    /// Checks an entry before it is stored under `address`.
    pub(crate) fn validate(&self, address: &str) -> ContainerResult<()> {
        let source = self.source.as_ref().ok_or_else(|| ContainerError::InvalidEntry {
            address: address.to_string(),
            reason: "no source".to_string(),
        })?;

        let declared = source.params();
        if let Some((index, name)) = declared
            .iter()
            .enumerate()
            .find(|(index, name)| declared[..*index].contains(*name))
        {
            return Err(ContainerError::InvalidEntry {
                address: address.to_string(),
                reason: format!("parameter \"{}\" declared twice (position {})", name, index),
            });
        }

        self.params.flatten(address).map(|_| ())
    }
}

/// Ordered address → entry pairs, the configuration surface modules use.
#[derive(Clone, Default, Debug)]
pub struct DependencyMap {
    entries: Vec<(String, Entry)>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn with(mut self, address: impl Into<String>, entry: Entry) -> Self {
        self.insert(address, entry);
        self
    }

    pub fn insert(&mut self, address: impl Into<String>, entry: Entry) {
        self.entries.push((address.into(), entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(address, _)| address.as_str())
    }
}

impl IntoIterator for DependencyMap {
    type Item = (String, Entry);
    type IntoIter = std::vec::IntoIter<(String, Entry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<S: Into<String>> FromIterator<(S, Entry)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (S, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(address, entry)| (address.into(), entry)).collect(),
        }
    }
}

impl<S: Into<String>> Extend<(S, Entry)> for DependencyMap {
    fn extend<I: IntoIterator<Item = (S, Entry)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(address, entry)| (address.into(), entry)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_binding_of_same_kind_wins() {
        let params = Params::new().literal("port", 80u16).literal("port", 8080u16);
        let flat = params.flatten("net/Server").unwrap();
        assert_eq!(flat.len(), 1);
        match &flat[0].1 {
            Param::Literal(value) => assert_eq!(value.downcast_ref::<u16>(), Some(&8080)),
            Param::Resolved(_) => panic!("expected literal"),
        }
    }

    #[test]
    fn test_mixed_kinds_under_one_name_collide() {
        let params = Params::new()
            .literal("name", "x".to_string())
            .resolved("name", |_| Ok("y".to_string()));
        let err = params.flatten("base/Greeter").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::ParamKeyCollision { ref param, .. } if param == "name"
        ));
    }

    #[test]
    fn test_overrides_replace_defaults_across_kinds() {
        let defaults = Params::new().resolved("name", |_| Ok("default".to_string()));
        let overrides = Params::new().literal("name", "override".to_string());
        let merged = overrides.merged_over(&defaults, "base/Greeter").unwrap();
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].1.is_resolved());
    }

    #[test]
    fn test_merge_keeps_default_order_then_new_names() {
        let defaults = Params::new().literal("a", 1i32).literal("b", 2i32);
        let overrides = Params::new().literal("c", 3i32).literal("a", 10i32);
        let merged = overrides.merged_over(&defaults, "x/Y").unwrap();
        let names: Vec<&str> = merged.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_args_project_onto_declared_order() {
        let names = vec!["host".to_string(), "port".to_string(), "token".to_string()];
        let mut resolved: HashMap<String, Instance> = HashMap::new();
        resolved.insert("port".into(), Arc::new(3000u16));
        resolved.insert("host".into(), Arc::new("localhost".to_string()));
        resolved.insert("unused".into(), Arc::new(true));

        let args = Args::project("app/clients/HttpClient", &names, resolved);
        assert_eq!(args.len(), 3);
        assert_eq!(args.cloned::<String>("host").unwrap().as_deref(), Some("localhost"));
        assert_eq!(args.at(1).and_then(|v| v.downcast_ref::<u16>()), Some(&3000));
        assert!(args.at(2).is_none());
        assert!(args.value("unused").is_none());
    }

    #[test]
    fn test_args_report_missing_and_mismatched() {
        let names = vec!["port".to_string()];
        let mut resolved: HashMap<String, Instance> = HashMap::new();
        resolved.insert("port".into(), Arc::new("not a number".to_string()));
        let args = Args::project("net/Server", &names, resolved);

        assert!(matches!(
            args.require::<u16>("port"),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            args.require::<u16>("timeout"),
            Err(ContainerError::MissingParam { ref param, .. }) if param == "timeout"
        ));
    }

    #[test]
    fn test_entry_without_source_is_invalid() {
        let err = Entry::default().validate("x/Y").unwrap_err();
        assert!(matches!(err, ContainerError::InvalidEntry { .. }));
    }

    #[test]
    fn test_entry_with_repeated_parameter_is_invalid() {
        let entry = Entry::new(Source::factory(["a", "b", "a"], |_, _| Ok(())));
        let err = entry.validate("x/Y").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::InvalidEntry { ref reason, .. } if reason.contains("\"a\"")
        ));
    }

    #[test]
    fn test_dependency_map_keeps_insertion_order() {
        let map: DependencyMap = vec![
            ("b/Second", Entry::new(Source::value(2u8))),
            ("a/First", Entry::new(Source::value(1u8))),
        ]
        .into_iter()
        .collect();
        let addresses: Vec<&str> = map.addresses().collect();
        assert_eq!(addresses, ["b/Second", "a/First"]);
    }
}
