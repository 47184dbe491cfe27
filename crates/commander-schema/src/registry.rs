//! # Schema Registry
//!
//! [`SchemaBuilder`] collects type declarations; [`SchemaBuilder::build`]
//! validates them once and produces an immutable [`Schema`].
//!
//! ## Build Steps
//!
//! 1. Register names. Primitive names are reserved; duplicates are rejected.
//! 2. Check `extends` chains: parents must be registered structures and
//!    chains must not loop.
//! 3. Resolve every bindable field's descriptor and choose its coercion.
//! 4. Flatten: own fields, then each ancestor's fields up the chain. A field
//!    identifier contributed by a nearer generation is not contributed again.
//!    Fields without a descriptor never shadow an ancestor's binding.
//! 5. Reject structure cycles (see [`SchemaBuilder::allow_recursion`]).
//!
//! ## Thread Safety
//!
//! `Schema` is `Send + Sync` and never mutated after `build`; share it
//! behind an `Arc`.

use std::collections::{BTreeMap, HashMap, HashSet};

use commander_core::{Instance, Primitive, SchemaError};

use crate::decl::{ScalarDecl, StructureDecl};
use crate::plan::{Coercion, FieldKind, FieldPlan, StructurePlan};

/// Collects declarations for a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    structures: Vec<StructureDecl>,
    scalars: Vec<ScalarDecl>,
    allow_recursion: bool,
}

impl SchemaBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structure type.
    pub fn structure(mut self, decl: StructureDecl) -> Self {
        self.structures.push(decl);
        self
    }

    /// Register a scalar-wrapper type.
    pub fn scalar(mut self, decl: ScalarDecl) -> Self {
        self.scalars.push(decl);
        self
    }

    /// Permit recursive structures.
    ///
    /// By default every cycle through structure fields is rejected. With
    /// recursion allowed, only cycles made entirely of required single-valued
    /// structure fields are rejected, since no finite payload satisfies them;
    /// cycles through nullable or list fields are accepted and the binder's
    /// depth limit applies.
    pub fn allow_recursion(mut self, allow: bool) -> Self {
        self.allow_recursion = allow;
        self
    }

    /// Validate the declarations and produce the schema.
    ///
    /// # Errors
    ///
    /// The first [`SchemaError`] found, in declaration order.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut seen = HashSet::new();
        let names = self
            .structures
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.scalars.iter().map(|s| s.name.as_str()));
        for name in names {
            if Primitive::from_name(name).is_some() {
                return Err(SchemaError::ReservedTypeName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateType(name.to_string()));
            }
        }

        let structures: HashMap<&str, &StructureDecl> = self
            .structures
            .iter()
            .map(|s| (s.name.as_str(), s))
            .collect();
        let scalars: HashMap<&str, &ScalarDecl> =
            self.scalars.iter().map(|s| (s.name.as_str(), s)).collect();

        for decl in &self.structures {
            check_duplicate_fields(decl)?;
            check_extends_chain(decl, &structures)?;
        }

        let mut own_plans: HashMap<&str, Vec<FieldPlan>> = HashMap::new();
        for decl in &self.structures {
            let mut plans = Vec::new();
            for field in &decl.fields {
                let Some(descriptor) = field.resolve(&decl.name)? else {
                    continue;
                };
                let coercion = choose_coercion(&decl.name, &field.ident, &descriptor, &structures, &scalars)?;
                let kind = if descriptor.is_list() {
                    FieldKind::List(coercion)
                } else {
                    FieldKind::Scalar(coercion)
                };
                plans.push(FieldPlan {
                    ident: field.ident.clone(),
                    declared_by: decl.name.clone(),
                    descriptor,
                    kind,
                });
            }
            own_plans.insert(decl.name.as_str(), plans);
        }

        let mut flattened = BTreeMap::new();
        for decl in &self.structures {
            let mut fields: Vec<FieldPlan> = Vec::new();
            let mut current = Some(decl);
            while let Some(generation) = current {
                for plan in own_plans.get(generation.name.as_str()).into_iter().flatten() {
                    if !fields.iter().any(|f| f.ident == plan.ident) {
                        fields.push(plan.clone());
                    }
                }
                current = generation
                    .extends
                    .as_deref()
                    .and_then(|parent| structures.get(parent).copied());
            }
            flattened.insert(
                decl.name.clone(),
                StructurePlan {
                    name: decl.name.clone(),
                    extends: decl.extends.clone(),
                    fields,
                },
            );
        }

        let order: Vec<&str> = self.structures.iter().map(|s| s.name.as_str()).collect();
        if let Some(path) = find_structure_cycle(&order, &flattened, self.allow_recursion) {
            return Err(SchemaError::StructureCycle { path });
        }

        let scalar_names = self.scalars.iter().map(|s| s.name.clone()).collect();
        tracing::debug!(
            structures = flattened.len(),
            scalars = self.scalars.len(),
            allow_recursion = self.allow_recursion,
            "schema built"
        );

        Ok(Schema {
            structures: flattened,
            scalars: scalar_names,
        })
    }
}

/// An immutable, validated registry of structure plans.
#[derive(Debug, Clone)]
pub struct Schema {
    structures: BTreeMap<String, StructurePlan>,
    scalars: HashSet<String>,
}

impl Schema {
    /// Start a new builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Look up a structure's flattened plan.
    pub fn structure(&self, name: &str) -> Option<&StructurePlan> {
        self.structures.get(name)
    }

    /// Whether `name` is a registered scalar-wrapper type.
    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalars.contains(name)
    }

    /// Create an empty instance of a registered structure.
    pub fn instantiate(&self, name: &str) -> Option<Instance> {
        self.structures.get(name).map(|plan| Instance::new(plan.name.clone()))
    }

    /// Names of all registered structures, sorted.
    pub fn structure_names(&self) -> impl Iterator<Item = &str> {
        self.structures.keys().map(String::as_str)
    }

    /// Number of registered structures.
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Number of registered scalar-wrapper types.
    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }
}

fn check_duplicate_fields(decl: &StructureDecl) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in &decl.fields {
        if !seen.insert(field.ident.as_str()) {
            return Err(SchemaError::DuplicateField {
                owner: decl.name.clone(),
                field: field.ident.clone(),
            });
        }
    }
    Ok(())
}

fn check_extends_chain(
    decl: &StructureDecl,
    structures: &HashMap<&str, &StructureDecl>,
) -> Result<(), SchemaError> {
    let mut path = vec![decl.name.clone()];
    let mut current = decl;
    while let Some(parent) = current.extends.as_deref() {
        let Some(next) = structures.get(parent).copied() else {
            return Err(SchemaError::UnknownParent {
                owner: current.name.clone(),
                parent: parent.to_string(),
            });
        };
        if path.iter().any(|p| p == parent) {
            path.push(parent.to_string());
            return Err(SchemaError::InheritanceCycle { path });
        }
        path.push(parent.to_string());
        current = next;
    }
    Ok(())
}

fn choose_coercion(
    owner: &str,
    ident: &str,
    descriptor: &commander_core::ResolvedDescriptor,
    structures: &HashMap<&str, &StructureDecl>,
    scalars: &HashMap<&str, &ScalarDecl>,
) -> Result<Coercion, SchemaError> {
    let type_name = descriptor.bare_name();

    if let Some(primitive) = descriptor.primitive() {
        if descriptor.is_structure || descriptor.factory.is_some() {
            tracing::warn!(
                owner,
                field = ident,
                type_name,
                "structure and factory settings are ignored on primitive fields"
            );
        }
        return Ok(Coercion::Primitive(primitive));
    }

    if structures.contains_key(type_name) {
        if !descriptor.is_structure {
            return Err(SchemaError::ConstructedStructure {
                owner: owner.to_string(),
                field: ident.to_string(),
                type_name: type_name.to_string(),
            });
        }
        return Ok(Coercion::Structure(type_name.to_string()));
    }

    let Some(scalar) = scalars.get(type_name) else {
        return Err(SchemaError::UnknownType {
            owner: owner.to_string(),
            field: ident.to_string(),
            type_name: type_name.to_string(),
        });
    };

    if descriptor.is_structure {
        return Err(SchemaError::NotAStructure {
            owner: owner.to_string(),
            field: ident.to_string(),
            type_name: type_name.to_string(),
        });
    }

    match &descriptor.factory {
        Some(factory) => {
            let constructor = scalar.factories.get(factory).cloned().ok_or_else(|| {
                SchemaError::UnknownFactory {
                    owner: owner.to_string(),
                    field: ident.to_string(),
                    type_name: type_name.to_string(),
                    factory: factory.clone(),
                }
            })?;
            Ok(Coercion::FactoryConstructed {
                type_name: type_name.to_string(),
                factory: factory.clone(),
                constructor,
            })
        }
        None => {
            let constructor = scalar.constructor.clone().ok_or_else(|| {
                SchemaError::MissingConstructor {
                    owner: owner.to_string(),
                    field: ident.to_string(),
                    type_name: type_name.to_string(),
                }
            })?;
            Ok(Coercion::Constructed {
                type_name: type_name.to_string(),
                constructor,
            })
        }
    }
}

struct Edge<'a> {
    label: String,
    target: &'a str,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search for a cycle through structure fields.
///
/// Returns the `Type.field` hops of the first cycle found, ending with the
/// type the cycle returns to.
fn find_structure_cycle(
    order: &[&str],
    plans: &BTreeMap<String, StructurePlan>,
    allow_recursion: bool,
) -> Option<Vec<String>> {
    let mut graph: HashMap<&str, Vec<Edge<'_>>> = HashMap::new();
    for (name, plan) in plans {
        let edges = plan
            .fields
            .iter()
            .filter_map(|field| match &field.kind {
                FieldKind::Scalar(Coercion::Structure(target)) => {
                    let required = !field.is_nullable();
                    (!allow_recursion || required).then_some((field, target))
                }
                FieldKind::List(Coercion::Structure(target)) => {
                    (!allow_recursion).then_some((field, target))
                }
                _ => None,
            })
            .map(|(field, target)| Edge {
                label: format!("{name}.{}", field.ident),
                target: target.as_str(),
            })
            .collect();
        graph.insert(name.as_str(), edges);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut trail: Vec<(&str, &str)> = Vec::new();
    for &start in order {
        if marks.contains_key(start) {
            continue;
        }
        if let Some(path) = visit(start, &graph, &mut marks, &mut trail) {
            return Some(path);
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    graph: &'a HashMap<&'a str, Vec<Edge<'a>>>,
    marks: &mut HashMap<&'a str, Mark>,
    trail: &mut Vec<(&'a str, &'a str)>,
) -> Option<Vec<String>> {
    marks.insert(node, Mark::Visiting);
    for edge in graph.get(node).into_iter().flatten() {
        trail.push((node, edge.label.as_str()));
        match marks.get(edge.target).copied() {
            Some(Mark::Visiting) => {
                let start = trail
                    .iter()
                    .position(|(owner, _)| *owner == edge.target)
                    .unwrap_or(0);
                let mut path: Vec<String> =
                    trail[start..].iter().map(|(_, label)| label.to_string()).collect();
                path.push(edge.target.to_string());
                return Some(path);
            }
            Some(Mark::Done) => {}
            None => {
                if let Some(path) = visit(edge.target, graph, marks, trail) {
                    return Some(path);
                }
            }
        }
        trail.pop();
    }
    marks.insert(node, Mark::Done);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use commander_core::{FieldDecl, FieldDescriptor};
    use serde_json::Value;

    #[derive(Debug, PartialEq)]
    struct Email(String);

    fn email() -> ScalarDecl {
        ScalarDecl::new("Email").constructor(|raw: &Value| {
            raw.as_str()
                .filter(|s| s.contains('@'))
                .map(|s| Email(s.to_string()))
                .ok_or("not an email address")
        })
    }

    fn address() -> StructureDecl {
        StructureDecl::new("Address")
            .field(FieldDecl::new("city").declared("string").bind(FieldDescriptor::new()))
    }

    #[test]
    fn test_build_order_schema() {
        let schema = Schema::builder()
            .structure(address())
            .structure(
                StructureDecl::new("Order")
                    .field(FieldDecl::new("id").declared("int").bind(FieldDescriptor::new()))
                    .field(FieldDecl::new("tags").bind(FieldDescriptor::new().ty("string[]")))
                    .field(
                        FieldDecl::new("ship")
                            .declared_nullable("Address")
                            .bind(FieldDescriptor::new().structure()),
                    )
                    .field(FieldDecl::new("cache").declared("string")),
            )
            .build()
            .unwrap();

        let order = schema.structure("Order").unwrap();
        let idents: Vec<&str> = order.fields.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["id", "tags", "ship"]);
        assert!(matches!(
            order.field("tags").unwrap().kind,
            FieldKind::List(Coercion::Primitive(Primitive::String))
        ));
        assert!(matches!(
            &order.field("ship").unwrap().kind,
            FieldKind::Scalar(Coercion::Structure(t)) if t == "Address"
        ));
        assert_eq!(schema.structure_count(), 2);
    }

    #[test]
    fn test_inherited_fields_follow_own_fields() {
        let schema = Schema::builder()
            .structure(
                StructureDecl::new("Command")
                    .field(FieldDecl::new("request_id").declared("string").bind(FieldDescriptor::new()))
                    .field(FieldDecl::new("note").declared("string").bind(FieldDescriptor::new())),
            )
            .structure(
                StructureDecl::new("CreateOrder")
                    .extends("Command")
                    .field(FieldDecl::new("id").declared("int").bind(FieldDescriptor::new()))
                    .field(
                        FieldDecl::new("note")
                            .declared_nullable("string")
                            .bind(FieldDescriptor::new().name("comment")),
                    ),
            )
            .build()
            .unwrap();

        let plan = schema.structure("CreateOrder").unwrap();
        let idents: Vec<(&str, &str)> = plan
            .fields
            .iter()
            .map(|f| (f.ident.as_str(), f.declared_by.as_str()))
            .collect();
        assert_eq!(
            idents,
            vec![
                ("id", "CreateOrder"),
                ("note", "CreateOrder"),
                ("request_id", "Command"),
            ]
        );
        assert_eq!(plan.field("note").unwrap().binding_name(), "comment");
    }

    #[test]
    fn test_unannotated_redeclaration_keeps_ancestor_binding() {
        let schema = Schema::builder()
            .structure(
                StructureDecl::new("Base")
                    .field(FieldDecl::new("code").declared("string").bind(FieldDescriptor::new())),
            )
            .structure(
                StructureDecl::new("Child")
                    .extends("Base")
                    .field(FieldDecl::new("code").declared("string")),
            )
            .build()
            .unwrap();
        let plan = schema.structure("Child").unwrap();
        assert_eq!(plan.field("code").unwrap().declared_by, "Base");
    }

    #[test]
    fn test_scalar_constructor_and_factory() {
        let money = ScalarDecl::new("Money").factory("fromCents", |raw: &Value| {
            raw.as_i64().ok_or("cents must be an integer")
        });
        let schema = Schema::builder()
            .scalar(email())
            .scalar(money)
            .structure(
                StructureDecl::new("Invoice")
                    .field(FieldDecl::new("contact").declared("Email").bind(FieldDescriptor::new()))
                    .field(
                        FieldDecl::new("total")
                            .declared("Money")
                            .bind(FieldDescriptor::new().factory("fromCents")),
                    ),
            )
            .build()
            .unwrap();
        let plan = schema.structure("Invoice").unwrap();
        assert!(matches!(
            plan.field("contact").unwrap().kind,
            FieldKind::Scalar(Coercion::Constructed { .. })
        ));
        assert!(matches!(
            &plan.field("total").unwrap().kind,
            FieldKind::Scalar(Coercion::FactoryConstructed { factory, .. }) if factory == "fromCents"
        ));
        assert!(schema.is_scalar("Money"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = Schema::builder()
            .structure(
                StructureDecl::new("Order")
                    .field(FieldDecl::new("ship").declared("Address").bind(FieldDescriptor::new().structure())),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                owner: "Order".into(),
                field: "ship".into(),
                type_name: "Address".into(),
            }
        );
    }

    #[test]
    fn test_metadata_resolution_error_surfaces() {
        let err = Schema::builder()
            .structure(StructureDecl::new("Order").field(FieldDecl::new("id").bind(FieldDescriptor::new())))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MetadataResolution { .. }));
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        let err = Schema::builder()
            .structure(StructureDecl::new("int"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::ReservedTypeName("int".into()));

        let err = Schema::builder()
            .structure(address())
            .scalar(ScalarDecl::new("Address"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("Address".into()));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::builder()
            .structure(
                StructureDecl::new("Order")
                    .field(FieldDecl::new("id").declared("int"))
                    .field(FieldDecl::new("id").declared("int")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn test_unknown_parent_and_inheritance_cycle() {
        let err = Schema::builder()
            .structure(StructureDecl::new("A").extends("Missing"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownParent {
                owner: "A".into(),
                parent: "Missing".into(),
            }
        );

        let err = Schema::builder()
            .structure(StructureDecl::new("A").extends("B"))
            .structure(StructureDecl::new("B").extends("A"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InheritanceCycle {
                path: vec!["A".into(), "B".into(), "A".into()],
            }
        );
    }

    #[test]
    fn test_structure_flag_mismatches() {
        let err = Schema::builder()
            .scalar(email())
            .structure(
                StructureDecl::new("User")
                    .field(FieldDecl::new("email").declared("Email").bind(FieldDescriptor::new().structure())),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotAStructure { .. }));

        let err = Schema::builder()
            .structure(address())
            .structure(
                StructureDecl::new("User")
                    .field(FieldDecl::new("home").declared("Address").bind(FieldDescriptor::new())),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ConstructedStructure { .. }));
    }

    #[test]
    fn test_missing_constructor_and_unknown_factory() {
        let err = Schema::builder()
            .scalar(ScalarDecl::new("Money"))
            .structure(
                StructureDecl::new("Invoice")
                    .field(FieldDecl::new("total").declared("Money").bind(FieldDescriptor::new())),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingConstructor { .. }));

        let err = Schema::builder()
            .scalar(email())
            .structure(
                StructureDecl::new("User").field(
                    FieldDecl::new("email")
                        .declared("Email")
                        .bind(FieldDescriptor::new().factory("fromLocalPart")),
                ),
            )
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownFactory { ref factory, .. } if factory == "fromLocalPart"
        ));
    }

    #[test]
    fn test_primitive_ignores_structure_flag() {
        let schema = Schema::builder()
            .structure(
                StructureDecl::new("Order").field(
                    FieldDecl::new("id")
                        .declared("int")
                        .bind(FieldDescriptor::new().structure().factory("parse")),
                ),
            )
            .build()
            .unwrap();
        assert!(matches!(
            schema.structure("Order").unwrap().field("id").unwrap().kind,
            FieldKind::Scalar(Coercion::Primitive(Primitive::Int))
        ));
    }

    fn tree(next: FieldDecl) -> StructureDecl {
        StructureDecl::new("Node")
            .field(FieldDecl::new("label").declared("string").bind(FieldDescriptor::new()))
            .field(next)
    }

    #[test]
    fn test_cycles_rejected_by_default() {
        let err = Schema::builder()
            .structure(tree(
                FieldDecl::new("children").bind(FieldDescriptor::new().ty("Node[]").structure()),
            ))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::StructureCycle {
                path: vec!["Node.children".into(), "Node".into()],
            }
        );
    }

    #[test]
    fn test_mutual_cycle_path() {
        let err = Schema::builder()
            .structure(
                StructureDecl::new("A")
                    .field(FieldDecl::new("b").declared_nullable("B").bind(FieldDescriptor::new().structure())),
            )
            .structure(
                StructureDecl::new("B")
                    .field(FieldDecl::new("a").declared_nullable("A").bind(FieldDescriptor::new().structure())),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::StructureCycle {
                path: vec!["A.b".into(), "B.a".into(), "A".into()],
            }
        );
    }

    #[test]
    fn test_recursion_through_optional_fields_allowed() {
        let schema = Schema::builder()
            .allow_recursion(true)
            .structure(tree(
                FieldDecl::new("children").bind(FieldDescriptor::new().ty("Node[]").structure()),
            ))
            .build();
        assert!(schema.is_ok());

        let schema = Schema::builder()
            .allow_recursion(true)
            .structure(tree(
                FieldDecl::new("next").declared_nullable("Node").bind(FieldDescriptor::new().structure()),
            ))
            .build();
        assert!(schema.is_ok());
    }

    #[test]
    fn test_required_cycle_rejected_even_when_recursion_allowed() {
        let err = Schema::builder()
            .allow_recursion(true)
            .structure(tree(
                FieldDecl::new("next").declared("Node").bind(FieldDescriptor::new().structure()),
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::StructureCycle { .. }));
    }

    #[test]
    fn test_instantiate() {
        let schema = Schema::builder().structure(address()).build().unwrap();
        let instance = schema.instantiate("Address").unwrap();
        assert_eq!(instance.type_name(), "Address");
        assert!(instance.is_empty());
        assert!(schema.instantiate("Order").is_none());
    }

    #[test]
    fn test_schema_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
