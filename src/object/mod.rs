pub mod native;
mod universe;

use crate::{
    string::IdentName,
    value::{Callable, Value},
};
use native::NativeMethod;
use std::{cell::RefCell, collections::HashMap, rc::Rc};
pub use universe::{BuiltinClasses, Universe};

/// Anything that can serve as `self` for `@name` reads and writes.
pub trait AttributeBearing {
    fn get_attribute(&self, name: &str) -> Option<Value>;
    fn set_attribute(&self, name: IdentName, value: Value);
    fn attribute_names(&self) -> Vec<IdentName>;
}

/// Insertion ordered name to value storage for instance and class variables.
#[derive(Debug, Default, Clone)]
pub struct AttributeTable {
    entries: Vec<(IdentName, Value)>,
}

impl AttributeTable {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key.as_ref() == name)
    }

    pub fn set(&mut self, name: IdentName, value: Value) {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn names(&self) -> Vec<IdentName> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }
}

#[derive(Clone)]
pub enum Method {
    Defined(Rc<Callable>),
    Native(Rc<dyn NativeMethod>),
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Defined(callable) => write!(f, "Defined({})", callable.get_name()),
            Method::Native(native) => write!(f, "Native({})", native.get_name()),
        }
    }
}

#[derive(Clone)]
pub struct Class {
    inner: Rc<ClassImpl>,
}

struct ClassImpl {
    name: IdentName,
    super_class: Option<Class>,
    allocatable: bool,
    methods: RefCell<HashMap<IdentName, Method>>,
    attributes: RefCell<AttributeTable>,
    class_variables: RefCell<AttributeTable>,
}

impl Class {
    pub fn new(name: IdentName, super_class: Option<Class>) -> Self {
        Self::new_builtin(name, super_class, true)
    }

    pub fn new_builtin(name: IdentName, super_class: Option<Class>, allocatable: bool) -> Self {
        Self {
            inner: Rc::new(ClassImpl {
                name,
                super_class,
                allocatable,
                methods: RefCell::new(HashMap::new()),
                attributes: RefCell::new(AttributeTable::default()),
                class_variables: RefCell::new(AttributeTable::default()),
            }),
        }
    }

    pub fn get_name(&self) -> &IdentName {
        &self.inner.name
    }

    pub fn get_super_class(&self) -> Option<&Class> {
        self.inner.super_class.as_ref()
    }

    pub fn is_allocatable(&self) -> bool {
        self.inner.allocatable
    }

    /// This class followed by its parents, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Class> {
        std::iter::successors(Some(self.clone()), |class| class.get_super_class().cloned())
    }

    pub fn find_method(&self, name: &str) -> Option<Method> {
        self.ancestors().find_map(|class| {
            let method = class.inner.methods.borrow().get(name).cloned();
            method
        })
    }

    /// Inserts or overwrites a method in this class's own table.
    pub fn define_method(&self, name: IdentName, method: Method) {
        self.inner.methods.borrow_mut().insert(name, method);
    }

    pub fn has_own_method(&self, name: &str) -> bool {
        self.inner.methods.borrow().contains_key(name)
    }

    /// The nearest class in the ancestor chain whose table holds `@@name`.
    pub fn find_class_variable_owner(&self, name: &str) -> Option<Class> {
        self.ancestors().find(|class| {
            let found = class.inner.class_variables.borrow().contains(name);
            found
        })
    }

    pub fn get_class_variable(&self, name: &str) -> Option<Value> {
        self.inner.class_variables.borrow().get(name)
    }

    pub fn set_class_variable(&self, name: IdentName, value: Value) {
        self.inner.class_variables.borrow_mut().set(name, value);
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AttributeBearing for Class {
    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.inner.attributes.borrow().get(name)
    }

    fn set_attribute(&self, name: IdentName, value: Value) {
        self.inner.attributes.borrow_mut().set(name, value);
    }

    fn attribute_names(&self) -> Vec<IdentName> {
        self.inner.attributes.borrow().names()
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Class({})", self.get_name())
    }
}

#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceImpl>,
}

struct InstanceImpl {
    class: Class,
    label: Option<IdentName>,
    attributes: RefCell<AttributeTable>,
}

impl Instance {
    pub fn new(class: Class) -> Self {
        Self::with_label(class, None)
    }

    /// An instance that renders as `label` instead of `#<ClassName>`.
    pub fn new_labelled(class: Class, label: IdentName) -> Self {
        Self::with_label(class, Some(label))
    }

    fn with_label(class: Class, label: Option<IdentName>) -> Self {
        Self {
            inner: Rc::new(InstanceImpl {
                class,
                label,
                attributes: RefCell::new(AttributeTable::default()),
            }),
        }
    }

    pub fn get_class(&self) -> &Class {
        &self.inner.class
    }

    pub fn get_label(&self) -> Option<&IdentName> {
        self.inner.label.as_ref()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AttributeBearing for Instance {
    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.inner.attributes.borrow().get(name)
    }

    fn set_attribute(&self, name: IdentName, value: Value) {
        self.inner.attributes.borrow_mut().set(name, value);
    }

    fn attribute_names(&self) -> Vec<IdentName> {
        self.inner.attributes.borrow().names()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.get_class().get_name())
    }
}
