//! Resource schema descriptor
//!
//! Declares attributes, their types, validators and plan modifiers the way the
//! host consumes them. Nested object attribute maps double as the shape the
//! value bridge flattens into.

use crate::validate::Validator;
use appstream_cloud::AttributePath;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
    Int,
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(BTreeMap<String, Attribute>),
    SetOfObjects(BTreeMap<String, Attribute>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanModifier {
    /// A change to the attribute destroys and recreates the resource
    RequiresReplace,
    /// An Unknown planned value takes the prior state's value
    UseStateForUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: Option<String>,
    pub validators: Vec<Validator>,
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String).required()
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String).optional()
    }

    pub fn computed_string() -> Self {
        Self::new(AttributeType::String).computed()
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool).optional()
    }

    pub fn optional_int() -> Self {
        Self::new(AttributeType::Int).optional()
    }

    pub fn string_set() -> Self {
        Self::new(AttributeType::Set(Box::new(AttributeType::String)))
    }

    pub fn string_map() -> Self {
        Self::new(AttributeType::Map(Box::new(AttributeType::String)))
    }

    pub fn object(attributes: impl IntoIterator<Item = (&'static str, Attribute)>) -> Self {
        Self::new(AttributeType::Object(collect(attributes)))
    }

    pub fn set_of_objects(attributes: impl IntoIterator<Item = (&'static str, Attribute)>) -> Self {
        Self::new(AttributeType::SetOfObjects(collect(attributes)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn has_plan_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    pub fn requires_replace(&self) -> bool {
        self.has_plan_modifier(PlanModifier::RequiresReplace)
    }

    /// Nested attributes of an object or set-of-objects attribute
    pub fn nested(&self) -> Option<&BTreeMap<String, Attribute>> {
        match &self.attr_type {
            AttributeType::Object(attrs) | AttributeType::SetOfObjects(attrs) => Some(attrs),
            _ => None,
        }
    }
}

fn collect(
    attributes: impl IntoIterator<Item = (&'static str, Attribute)>,
) -> BTreeMap<String, Attribute> {
    attributes
        .into_iter()
        .map(|(name, attr)| (name.to_string(), attr))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub version: i64,
    pub description: Option<String>,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(version: i64) -> Self {
        Self {
            version,
            description: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Resolve a dotted path through nested object attributes
    pub fn attribute_at(&self, path: &AttributePath) -> Option<&Attribute> {
        let (first, rest) = path.steps().split_first()?;
        let mut current = self.attributes.get(first)?;
        for step in rest {
            current = current.nested()?.get(step)?;
        }
        Some(current)
    }

    /// Top-level attributes carrying `modifier`
    pub fn attributes_with(&self, modifier: PlanModifier) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(move |(_, attr)| attr.has_plan_modifier(modifier))
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(0)
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "vpc_config",
                Attribute::object([
                    ("subnet_ids", Attribute::string_set().optional()),
                    (
                        "security_group_ids",
                        Attribute::string_set()
                            .optional()
                            .with_validator(Validator::SizeBetween { min: 0, max: 5 }),
                    ),
                ])
                .optional(),
            )
    }

    #[test]
    fn test_attribute_at_nested() {
        let schema = schema();
        let path = AttributePath::root("vpc_config").child("security_group_ids");
        let attr = schema.attribute_at(&path).unwrap();
        assert_eq!(attr.validators.len(), 1);
        assert!(
            schema
                .attribute_at(&AttributePath::root("vpc_config").child("missing"))
                .is_none()
        );
        assert!(
            schema
                .attribute_at(&AttributePath::root("name").child("nested"))
                .is_none()
        );
    }

    #[test]
    fn test_required_and_optional_are_exclusive() {
        let attr = Attribute::required_string().optional();
        assert!(attr.optional);
        assert!(!attr.required);
    }

    #[test]
    fn test_attributes_with_modifier() {
        let schema = Schema::new(0)
            .with_attribute(
                "name",
                Attribute::required_string().with_plan_modifier(PlanModifier::RequiresReplace),
            )
            .with_attribute("tags", Attribute::string_map().optional());
        let replace: Vec<&str> = schema.attributes_with(PlanModifier::RequiresReplace).collect();
        assert_eq!(replace, vec!["name"]);
    }
}
