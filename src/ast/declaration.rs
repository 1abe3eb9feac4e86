use super::Statement;
use crate::graph::{Accessibility, Parameter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_virtual: bool,
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

/// The class shell wrapping every member generated for one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub namespace: String,
    pub usings: Vec<String>,
    pub name: String,
    pub base_class: Option<String>,
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<MethodDeclaration>,
}

impl ClassDeclaration {
    pub fn method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.name == name)
    }
}
