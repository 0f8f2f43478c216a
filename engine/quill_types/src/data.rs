//! Structural data stored in the type pool.
//!
//! Every pool entry is a [`TypeData`]. Basic scalar types and `void`/`any`
//! carry no payload; classes, arrays, and callables carry structural data
//! that the runtime value layer interprets.

use crate::TypeId;

/// The five basic scalar kinds, used by the conversion matrix.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BasicKind {
    Bool,
    Byte,
    Char,
    Int,
    Float,
}

impl BasicKind {
    /// Map a basic `TypeId` to its kind. Returns `None` for non-basic ids.
    pub fn of(id: TypeId) -> Option<Self> {
        match id {
            TypeId::BOOL => Some(Self::Bool),
            TypeId::BYTE => Some(Self::Byte),
            TypeId::CHAR => Some(Self::Char),
            TypeId::INT => Some(Self::Int),
            TypeId::FLOAT => Some(Self::Float),
            _ => None,
        }
    }

    /// The canonical type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

/// Coarse classification of a pool entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    Bool,
    Byte,
    Char,
    Int,
    Float,
    Void,
    Any,
    Class,
    Array,
    Callable,
}

/// Member kind: a stored field or an invocable method.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

/// Member accessibility, as seen from a subclass.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

impl Accessibility {
    /// Private members are invisible below the declaring class.
    #[inline]
    pub fn subclass_visible(self) -> bool {
        !matches!(self, Self::Private)
    }
}

/// A member declaration on a class.
///
/// For fields, `ty` is the field type. For methods, `ty` is a callable
/// type registered in the pool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberDecl {
    pub name: String,
    pub kind: MemberKind,
    pub ty: TypeId,
    pub access: Accessibility,
    pub is_const: bool,
    pub is_static: bool,
}

impl MemberDecl {
    pub fn field(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            ty,
            access: Accessibility::Public,
            is_const: false,
            is_static: false,
        }
    }

    pub fn method(name: impl Into<String>, callable: TypeId) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            ty: callable,
            access: Accessibility::Public,
            is_const: false,
            is_static: false,
        }
    }

    pub fn with_access(mut self, access: Accessibility) -> Self {
        self.access = access;
        self
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// Structural data for a class type.
#[derive(Clone, Debug)]
pub struct ClassData {
    pub name: String,
    /// Parent class; `None` only for the root `Object` class.
    pub parent: Option<TypeId>,
    pub members: Vec<MemberDecl>,
    /// Enum classes carry their constant literals in ordinal order.
    pub enum_literals: Option<Vec<String>>,
    /// Classes whose instances the host marks as order-comparable.
    pub comparable: bool,
}

impl ClassData {
    pub fn new(name: impl Into<String>, parent: TypeId) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            members: Vec::new(),
            enum_literals: None,
            comparable: false,
        }
    }

    pub fn with_members(mut self, members: Vec<MemberDecl>) -> Self {
        self.members = members;
        self
    }

    pub fn with_enum_literals(mut self, literals: Vec<String>) -> Self {
        self.enum_literals = Some(literals);
        self
    }

    pub fn with_comparable(mut self, comparable: bool) -> Self {
        self.comparable = comparable;
        self
    }
}

/// What flavor of callable a callable type describes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CallableKind {
    /// A free function declared at global scope.
    Function,
    /// An anonymous function with a captured display form.
    Lambda,
    /// An instance or static method of a class.
    Method,
    /// A class constructor.
    Ctor,
    /// A bundle of same-named method overloads.
    MethodGroup,
}

/// A declared parameter of a callable type.
///
/// The receiver is implicit and never appears in the parameter list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Structural data for a callable type.
#[derive(Clone, Debug)]
pub struct CallableData {
    pub kind: CallableKind,
    pub name: String,
    pub params: Vec<Param>,
    pub ret: TypeId,
    /// Containing class for methods and ctors.
    pub containing: Option<TypeId>,
    pub is_static: bool,
    /// Implemented by the host platform rather than script code.
    pub hosted: bool,
    /// For `MethodGroup`: the callable types of the bundled overloads.
    pub overloads: Vec<TypeId>,
}

impl CallableData {
    pub fn function(name: impl Into<String>, params: Vec<Param>, ret: TypeId) -> Self {
        Self {
            kind: CallableKind::Function,
            name: name.into(),
            params,
            ret,
            containing: None,
            is_static: false,
            hosted: false,
            overloads: Vec::new(),
        }
    }

    pub fn lambda(params: Vec<Param>, ret: TypeId) -> Self {
        Self {
            kind: CallableKind::Lambda,
            name: "<lambda>".into(),
            params,
            ret,
            containing: None,
            is_static: false,
            hosted: false,
            overloads: Vec::new(),
        }
    }

    pub fn method(
        name: impl Into<String>,
        containing: TypeId,
        params: Vec<Param>,
        ret: TypeId,
    ) -> Self {
        Self {
            kind: CallableKind::Method,
            name: name.into(),
            params,
            ret,
            containing: Some(containing),
            is_static: false,
            hosted: false,
            overloads: Vec::new(),
        }
    }

    pub fn ctor(containing: TypeId, params: Vec<Param>) -> Self {
        Self {
            kind: CallableKind::Ctor,
            name: "<init>".into(),
            params,
            ret: TypeId::VOID,
            containing: Some(containing),
            is_static: false,
            hosted: false,
            overloads: Vec::new(),
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_hosted(mut self, hosted: bool) -> Self {
        self.hosted = hosted;
        self
    }
}

/// A pool entry.
#[derive(Clone, Debug)]
pub enum TypeData {
    Bool,
    Byte,
    Char,
    Int,
    Float,
    Void,
    Any,
    Class(ClassData),
    /// A one-dimensional array over an element type. Multi-dimensional
    /// arrays nest: `[[int]]` is `Array(Array(int))`.
    Array { element: TypeId },
    Callable(CallableData),
}

impl TypeData {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Bool => TypeKind::Bool,
            Self::Byte => TypeKind::Byte,
            Self::Char => TypeKind::Char,
            Self::Int => TypeKind::Int,
            Self::Float => TypeKind::Float,
            Self::Void => TypeKind::Void,
            Self::Any => TypeKind::Any,
            Self::Class(_) => TypeKind::Class,
            Self::Array { .. } => TypeKind::Array,
            Self::Callable(_) => TypeKind::Callable,
        }
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match self {
            Self::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&CallableData> {
        match self {
            Self::Callable(data) => Some(data),
            _ => None,
        }
    }
}
