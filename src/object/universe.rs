use super::{native, Class, Instance};
use crate::{string::IdentName, value::Value};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct BuiltinClasses {
    pub object: Class,
    pub class: Class,
    pub integer: Class,
    pub string: Class,
    pub array: Class,
    pub nil: Class,
    pub true_class: Class,
    pub false_class: Class,
    pub proc_class: Class,
}

impl BuiltinClasses {
    fn new() -> Self {
        let object = Class::new_builtin("Object".into(), None, true);
        let derive = |name: &str, allocatable: bool| {
            Class::new_builtin(name.into(), Some(object.clone()), allocatable)
        };
        Self {
            class: derive("Class", false),
            integer: derive("Integer", false),
            string: derive("String", false),
            array: derive("Array", false),
            nil: derive("NilClass", false),
            true_class: derive("TrueClass", false),
            false_class: derive("FalseClass", false),
            proc_class: derive("Proc", false),
            object,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Class> {
        [
            &self.object,
            &self.class,
            &self.integer,
            &self.string,
            &self.array,
            &self.nil,
            &self.true_class,
            &self.false_class,
            &self.proc_class,
        ]
        .into_iter()
    }
}

/// Process wide interpreter state outside of lexical frames: built-in classes, the constant
/// table, global variables and the top-level `self`.
#[derive(Debug)]
pub struct Universe {
    classes: BuiltinClasses,
    constants: HashMap<IdentName, Value>,
    globals: HashMap<IdentName, Value>,
    main: Instance,
}

impl Universe {
    pub fn new() -> Self {
        let classes = BuiltinClasses::new();
        native::install(&classes);

        let constants = classes
            .iter()
            .map(|class| (class.get_name().clone(), Value::Class(class.clone())))
            .collect();
        let main = Instance::new_labelled(classes.object.clone(), "main".into());

        Self {
            classes,
            constants,
            globals: HashMap::new(),
            main,
        }
    }

    pub fn get_classes(&self) -> &BuiltinClasses {
        &self.classes
    }

    pub fn get_main(&self) -> Value {
        Value::Instance(self.main.clone())
    }

    pub fn class_of(&self, value: &Value) -> Class {
        let classes = &self.classes;
        match value {
            Value::Integer(_) => classes.integer.clone(),
            Value::String(_) => classes.string.clone(),
            Value::Bool(true) => classes.true_class.clone(),
            Value::Bool(false) => classes.false_class.clone(),
            Value::Nil => classes.nil.clone(),
            Value::Array(_) => classes.array.clone(),
            Value::Callable(_) => classes.proc_class.clone(),
            Value::Class(_) => classes.class.clone(),
            Value::Instance(instance) => instance.get_class().clone(),
        }
    }

    pub fn get_constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    pub fn set_constant(&mut self, name: IdentName, value: Value) {
        self.constants.insert(name, value);
    }

    /// Unassigned globals read as `nil`.
    pub fn get_global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_global(&mut self, name: IdentName, value: Value) {
        self.globals.insert(name, value);
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}
