//! Schema descriptors and the builder that produces them.

use crate::alias::AliasSpec;
use crate::entity::Entity;
use crate::error::{AdaptError, ModelError, ModelResult};
use crate::fields::{EntityField, Field, FieldKind, FieldSpec};
use crate::reference::{self, Reference};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Schema-level adaptation hook, tried before the adapter registry when a
/// value is adapted to this schema. Returns `None` to decline.
pub type SchemaAdapter =
    Arc<dyn Fn(&Arc<Schema>, &Value) -> Option<ModelResult<Entity>> + Send + Sync>;

/// Ordered mapping of field name to [`FieldSpec`].
///
/// Replacing an existing name keeps its position, so inherited fields stay
/// first.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(String, FieldSpec)>,
    index: HashMap<String, usize>,
}

impl FieldMap {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    fn insert(&mut self, name: String, spec: FieldSpec) {
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = spec;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, spec));
        }
    }

    fn remove(&mut self, name: &str) {
        if self.index.remove(name).is_some() {
            self.entries.retain(|(n, _)| n != name);
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(i, (n, _))| (n.clone(), i))
                .collect();
        }
    }
}

/// The immutable descriptor of an entity type.
pub struct Schema {
    name: String,
    doc: Option<String>,
    fields: FieldMap,
    aliases: BTreeMap<String, AliasSpec>,
    bases: Vec<Arc<Schema>>,
    flexible: bool,
    adapter: Option<SchemaAdapter>,
}

impl Schema {
    /// Starts declaring a schema called `name` (a dotted identifier).
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            doc: None,
            bases: Vec::new(),
            flexible: false,
            declarations: Vec::new(),
            adapter: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Declared fields, inherited first.
    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<String, AliasSpec> {
        &self.aliases
    }

    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&AliasSpec> {
        self.aliases.get(name)
    }

    /// Whether instances accept names outside the declared fields.
    #[must_use]
    pub const fn is_flexible(&self) -> bool {
        self.flexible
    }

    #[must_use]
    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    /// Whether this schema is `other` or derives from it.
    #[must_use]
    pub fn is_a(&self, other: &Arc<Schema>) -> bool {
        std::ptr::eq(self, Arc::as_ptr(other)) || self.bases.iter().any(|base| base.is_a(other))
    }

    /// Runs the schema-level adaptation hook, if one is installed.
    pub fn adapt_hook(self: &Arc<Self>, value: &Value) -> Option<ModelResult<Entity>> {
        self.adapter.as_ref().and_then(|hook| hook(self, value))
    }

    /// An empty instance.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>) -> Entity {
        Entity::new(Arc::clone(self))
    }

    /// An instance built from initial values. Unknown keys are ignored.
    pub fn create<K, V>(self: &Arc<Self>, values: impl IntoIterator<Item = (K, V)>) -> ModelResult<Entity>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Entity::with_values(Arc::clone(self), values)
    }

    pub fn from_json(self: &Arc<Self>, json: &str) -> ModelResult<Entity> {
        Entity::from_json(Arc::clone(self), json)
    }

    /// Adapts any value to an instance of this schema.
    pub fn adapt(self: &Arc<Self>, value: impl Into<Value>) -> ModelResult<Entity> {
        let field = EntityField::new(self);
        match field.adapt(value.into())? {
            Value::Entity(entity) => Ok(entity),
            other => Err(AdaptError::to_target(&other, self.name()).into()),
        }
    }

    pub fn adapt_all<V: Into<Value>>(
        self: &Arc<Self>,
        values: impl IntoIterator<Item = V>,
    ) -> ModelResult<Vec<Entity>> {
        values.into_iter().map(|value| self.adapt(value)).collect()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.names().collect::<Vec<_>>())
            .field("aliases", &self.aliases.keys().collect::<Vec<_>>())
            .field("bases", &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("flexible", &self.flexible)
            .finish_non_exhaustive()
    }
}

/// One attribute declaration, in any of the accepted shorthands.
#[derive(Debug, Clone)]
pub enum Declaration {
    Field(FieldSpec),
    /// A default-constructed field of the kind.
    Kind(FieldKind),
    /// A nested entity field.
    Entity(Reference),
    /// A collection of the single contained declaration.
    List(Vec<Declaration>),
    Alias(AliasSpec),
}

impl Declaration {
    fn into_field_spec(self, name: &str) -> ModelResult<FieldSpec> {
        match self {
            Self::Field(spec) => Ok(spec),
            Self::Kind(kind) => kind.default_field().map(FieldSpec::from_arc).ok_or_else(|| {
                ModelError::invalid_declaration(name, format!("{kind} fields need a target"))
            }),
            Self::Entity(reference) => Ok(FieldSpec::entity(reference)),
            Self::List(mut items) => {
                if items.len() != 1 {
                    return Err(ModelError::invalid_declaration(
                        name,
                        format!("a collection declares exactly one kind, got {}", items.len()),
                    ));
                }
                let inner = items.remove(0);
                if matches!(inner, Self::Alias(_)) {
                    return Err(ModelError::invalid_declaration(
                        name,
                        "collections cannot hold aliases",
                    ));
                }
                Ok(FieldSpec::collection(inner.into_field_spec(name)?))
            }
            Self::Alias(_) => Err(ModelError::invalid_declaration(name, "an alias is not a field")),
        }
    }
}

impl From<FieldSpec> for Declaration {
    fn from(spec: FieldSpec) -> Self {
        Self::Field(spec)
    }
}

impl From<FieldKind> for Declaration {
    fn from(kind: FieldKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<Reference> for Declaration {
    fn from(reference: Reference) -> Self {
        Self::Entity(reference)
    }
}

impl From<Arc<Schema>> for Declaration {
    fn from(schema: Arc<Schema>) -> Self {
        Self::Entity(Reference::Schema(schema))
    }
}

impl From<&Arc<Schema>> for Declaration {
    fn from(schema: &Arc<Schema>) -> Self {
        Self::Entity(Reference::from(schema))
    }
}

/// A reference by name, or `"self"`.
impl From<&str> for Declaration {
    fn from(target: &str) -> Self {
        Self::Entity(Reference::from(target))
    }
}

impl From<AliasSpec> for Declaration {
    fn from(alias: AliasSpec) -> Self {
        Self::Alias(alias)
    }
}

impl<T: Into<Declaration>> From<Vec<T>> for Declaration {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Collects declarations and builds a [`Schema`].
#[must_use = "a schema is only defined once `build` is called"]
pub struct SchemaBuilder {
    name: String,
    doc: Option<String>,
    bases: Vec<Arc<Schema>>,
    flexible: bool,
    declarations: Vec<(String, Declaration)>,
    adapter: Option<SchemaAdapter>,
}

impl SchemaBuilder {
    /// Inherits fields and aliases from `base`. Later bases win on name clashes.
    pub fn extends(mut self, base: &Arc<Schema>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Instances may store names the schema does not declare.
    pub const fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.declarations.push((name.into(), declaration.into()));
        self
    }

    /// Declares `name` as an alias of the dotted `target` path.
    pub fn alias(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.field(name, AliasSpec::new(target))
    }

    pub fn adapt_with(
        mut self,
        hook: impl Fn(&Arc<Schema>, &Value) -> Option<ModelResult<Entity>> + Send + Sync + 'static,
    ) -> Self {
        self.adapter = Some(Arc::new(hook));
        self
    }

    /// Builds the schema, binds its fields and defines it in the catalog.
    pub fn build(self) -> ModelResult<Arc<Schema>> {
        if !reference::is_dotted_identifier(&self.name) {
            return Err(ModelError::invalid_declaration(
                &self.name,
                "schema names are dotted identifiers",
            ));
        }

        let mut fields = FieldMap::default();
        let mut aliases = BTreeMap::new();
        for base in &self.bases {
            for (name, spec) in base.fields.iter() {
                aliases.remove(name);
                fields.insert(name.to_string(), spec.clone());
            }
            for (name, alias) in &base.aliases {
                fields.remove(name);
                aliases.insert(name.clone(), alias.clone());
            }
        }

        for (name, declaration) in self.declarations {
            if name.is_empty() || name.contains(['.', '?']) {
                return Err(ModelError::invalid_declaration(
                    &name,
                    "attribute names cannot be empty or contain '.' or '?'",
                ));
            }
            match declaration {
                Declaration::Alias(alias) => {
                    fields.remove(&name);
                    aliases.insert(name, alias);
                }
                other => {
                    let spec = other.into_field_spec(&name)?;
                    aliases.remove(&name);
                    fields.insert(name, spec);
                }
            }
        }

        for (name, alias) in &aliases {
            alias.validate(name, &fields)?;
        }

        let flexible = self.flexible || self.bases.iter().any(|base| base.flexible);
        let adapter = self
            .adapter
            .or_else(|| self.bases.iter().rev().find_map(|base| base.adapter.clone()));

        let schema = Arc::new_cyclic(|owner| {
            for (_, spec) in fields.iter() {
                spec.bind(owner);
            }
            Schema {
                name: self.name,
                doc: self.doc,
                fields,
                aliases,
                bases: self.bases,
                flexible,
                adapter,
            }
        });
        reference::define(&schema);
        Ok(schema)
    }
}
