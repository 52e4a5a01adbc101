use std::fmt;

/// A parsed data object: the name of its template and one value per template member (open members contribute one
/// `Value::Structure` per child instead).
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub name: String,
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    Str(String),
    IntArray(Vec<i32>),
    FloatArray(Vec<f64>),
    Structure(Structure),
    StructureArray(Vec<Structure>),
}

impl Structure {
    pub fn new<T: Into<String>>(name: T, data: Vec<Value>) -> Self {
        Structure {
            name: name.into(),
            data,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.data.get(index)
    }

    pub fn get_int(&self, index: usize) -> Option<i32> {
        match self.data.get(index) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, index: usize) -> Option<f64> {
        match self.data.get(index) {
            Some(Value::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, index: usize) -> Option<&str> {
        match self.data.get(index) {
            Some(Value::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_int_vec(&self, index: usize) -> Option<&[i32]> {
        match self.data.get(index) {
            Some(Value::IntArray(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_float_vec(&self, index: usize) -> Option<&[f64]> {
        match self.data.get(index) {
            Some(Value::FloatArray(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_structure(&self, index: usize) -> Option<&Structure> {
        match self.data.get(index) {
            Some(Value::Structure(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_structures(&self, index: usize) -> Option<&[Structure]> {
        match self.data.get(index) {
            Some(Value::StructureArray(v)) => Some(v),
            _ => None,
        }
    }

    /// Every nested structure stored directly in `data`, in order. Structure arrays are not included.
    pub fn children(&self) -> impl Iterator<Item = &Structure> {
        self.data.iter().filter_map(|value| match value {
            Value::Structure(s) => Some(s),
            _ => None,
        })
    }

    /// Children with the given template name.
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Structure> + 'a {
        self.children().filter(move |s| s.name == name)
    }
}

fn fmt_structure(f: &mut fmt::Formatter, structure: &Structure, ident: usize) -> fmt::Result {
    let ident_str: String = std::iter::repeat(" ").take(4 * ident).collect();

    if structure.name.is_empty() {
        writeln!(f, "{{")?;
    } else {
        writeln!(f, "{} {{", structure.name)?;
    }

    for value in &structure.data {
        write!(f, "{}    ", ident_str)?;
        match value {
            Value::Int(v) => writeln!(f, "{};", v)?,
            Value::Float(v) => writeln!(f, "{:?};", v)?,
            Value::Str(v) => writeln!(f, "{:?};", v)?,
            Value::IntArray(v) => writeln!(f, "{:?};", v)?,
            Value::FloatArray(v) => writeln!(f, "{:?};", v)?,
            Value::Structure(s) => fmt_structure(f, s, ident + 1)?,
            Value::StructureArray(items) => {
                writeln!(f, "[")?;
                for item in items {
                    write!(f, "{}        ", ident_str)?;
                    fmt_structure(f, item, ident + 2)?;
                }
                writeln!(f, "{}    ];", ident_str)?;
            }
        }
    }

    writeln!(f, "{}}}", ident_str)
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_structure(f, self, 0)
    }
}
