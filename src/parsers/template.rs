//! Templates describe the members a data object of a given name contains. They are declared with the same syntax X
//! files use for their own template declarations and are resolved into `MemberSpec`s once, when the registry is
//! built.

use lazy_static::lazy_static;
use linked_hash_map::LinkedHashMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::opt,
    error::{ErrorKind, ParseError},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};
use crate::structure::Value;
use std::{borrow::Cow, collections::HashSet};
use thiserror::Error;

/// The templates every X file can use without declaring them.
pub const STANDARD_TEMPLATES: &str = r#"
template Header {
    WORD major;
    WORD minor;
    DWORD flags;
}

template Vector {
    FLOAT x;
    FLOAT y;
    FLOAT z;
}

template Coords2d {
    FLOAT u;
    FLOAT v;
}

template Matrix4x4 {
    array FLOAT matrix[16];
}

template ColorRGBA {
    FLOAT red;
    FLOAT green;
    FLOAT blue;
    FLOAT alpha;
}

template ColorRGB {
    FLOAT red;
    FLOAT green;
    FLOAT blue;
}

template IndexedColor {
    DWORD index;
    ColorRGBA indexColor;
}

template Boolean {
    WORD truefalse;
}

template Boolean2d {
    Boolean u;
    Boolean v;
}

template MaterialWrap {
    Boolean u;
    Boolean v;
}

template TextureFilename {
    STRING filename;
}

template Material {
    ColorRGBA faceColor;
    FLOAT power;
    ColorRGB specularColor;
    ColorRGB emissiveColor;
    [...]
}

template MeshFace {
    DWORD nFaceVertexIndices;
    array DWORD faceVertexIndices[nFaceVertexIndices];
}

template MeshFaceWraps {
    DWORD nFaceWrapValues;
    array Boolean2d faceWrapValues[nFaceWrapValues];
}

template MeshTextureCoords {
    DWORD nTextureCoords;
    array Coords2d textureCoords[nTextureCoords];
}

template MeshMaterialList {
    DWORD nMaterials;
    DWORD nFaceIndexes;
    array DWORD faceIndexes[nFaceIndexes];
    [Material]
}

template MeshNormals {
    DWORD nNormals;
    array Vector normals[nNormals];
    DWORD nFaceNormals;
    array MeshFace faceNormals[nFaceNormals];
}

template MeshVertexColors {
    DWORD nVertexColors;
    array IndexedColor vertexColors[nVertexColors];
}

template Mesh {
    DWORD nVertices;
    array Vector vertices[nVertices];
    DWORD nFaces;
    array MeshFace faces[nFaces];
    [...]
}

template FrameTransformMatrix {
    Matrix4x4 frameMatrix;
}

template Frame {
    [...]
}

template FloatKeys {
    DWORD nValues;
    array FLOAT values[nValues];
}

template TimedFloatKeys {
    DWORD time;
    FloatKeys tfkeys;
}

template AnimationKey {
    DWORD keyType;
    DWORD nKeys;
    array TimedFloatKeys keys[nKeys];
}

template AnimationOptions {
    DWORD openclosed;
    DWORD positionquality;
}

template Animation {
    [...]
}

template AnimationSet {
    [Animation]
}

template XSkinMeshHeader {
    WORD nMaxSkinWeightsPerVertex;
    WORD nMaxSkinWeightsPerFace;
    WORD nBones;
}

template SkinWeights {
    STRING transformNodeName;
    DWORD nWeights;
    array DWORD vertexIndices[nWeights];
    array FLOAT weights[nWeights];
    Matrix4x4 matrixOffset;
}

template VertexDuplicationIndices {
    DWORD nIndices;
    DWORD nOriginalVertices;
    array DWORD indices[nIndices];
}
"#;

lazy_static! {
    static ref STANDARD_REGISTRY: TemplateRegistry = TemplateRegistry::from_grammar(STANDARD_TEMPLATES)
        .expect("the standard templates are well-formed");
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Float,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Int,
    Float,
    Template(String),
}

/// Where the length of an array comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SizeSource {
    Literal(usize),
    /// Index of an already parsed value of the same structure. The value has to be an `Int`.
    Member(usize),
}

impl SizeSource {
    /// Resolves the length against the values already parsed for the structure being built.
    pub fn resolve(self, data: &[Value]) -> std::result::Result<usize, String> {
        match self {
            SizeSource::Literal(len) => Ok(len),
            SizeSource::Member(index) => match data.get(index) {
                Some(Value::Int(len)) if *len >= 0 => Ok(*len as usize),
                Some(Value::Int(len)) => Err(format!(
                    "array size taken from member {} is negative ({})",
                    index, len
                )),
                Some(_) => Err(format!(
                    "array size refers to member {}, which is not an integer",
                    index
                )),
                None => Err(format!(
                    "array size refers to member {} but only {} value(s) were parsed",
                    index,
                    data.len()
                )),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSpec {
    Primitive(Primitive),
    /// A nested template written without its own braces.
    InlineTemplate(String),
    Array(ElementKind, SizeSource),
    /// Zero or more child data objects, until the closing brace of the parent.
    AnyRepeated,
    /// Unknown content, skipped up to the closing brace of the parent. Only used by fallback templates.
    Opaque,
}

impl MemberSpec {
    /// Open members consume the closing brace of the template that owns them.
    pub fn is_open(&self) -> bool {
        match self {
            MemberSpec::AnyRepeated | MemberSpec::Opaque => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub members: Vec<MemberSpec>,
}

impl Template {
    /// The template of the whole file: any number of data objects until the end of the input.
    pub fn root() -> Self {
        Template {
            name: String::new(),
            members: vec![MemberSpec::AnyRepeated],
        }
    }

    /// The fallback for names that aren't in the registry.
    pub fn opaque<T: Into<String>>(name: T) -> Self {
        Template {
            name: name.into(),
            members: vec![MemberSpec::Opaque],
        }
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty() && self.members == [MemberSpec::AnyRepeated]
    }

    pub fn is_opaque(&self) -> bool {
        self.members == [MemberSpec::Opaque]
    }

    /// Whether the last member consumes the closing brace, so none is expected after the members.
    pub fn closes_itself(&self) -> bool {
        self.members.last().map(MemberSpec::is_open).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateGrammarError {
    #[error("syntax error near {near:?} ({kind:?})")]
    Syntax { near: String, kind: ErrorKind },
    #[error("template {template}: unknown type {type_name}")]
    UnknownType { template: String, type_name: String },
    #[error("template {template}: arrays of {type_name} are not supported")]
    UnsupportedArray { template: String, type_name: String },
    #[error("template {template}: array size {size} is neither a number nor an earlier integer member")]
    UnknownSizeMember { template: String, size: String },
    #[error("template {template}: an open member must be the last one")]
    OpenMemberNotLast { template: String },
    #[error("template {0} is declared twice")]
    Duplicate(String),
}

impl ParseError<&str> for TemplateGrammarError {
    fn from_error_kind(input: &str, kind: ErrorKind) -> Self {
        TemplateGrammarError::Syntax {
            near: input.chars().take(24).collect(),
            kind,
        }
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type Result<'a, T> = IResult<&'a str, T, TemplateGrammarError>;

#[derive(Debug)]
enum RawMember<'a> {
    Scalar {
        type_name: &'a str,
        name: &'a str,
    },
    Array {
        type_name: &'a str,
        size: &'a str,
    },
    Open,
}

#[derive(Debug)]
struct RawTemplate<'a> {
    name: &'a str,
    members: Vec<RawMember<'a>>,
}

/// Whitespace and `//` comments.
fn space(input: &str) -> Result<()> {
    let (input, _) = many0(alt((multispace1, preceded(tag("//"), not_line_ending))))(input)?;
    Ok((input, ()))
}

fn identifier(input: &str) -> Result<&str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn guid(input: &str) -> Result<&str> {
    delimited(char('<'), take_until(">"), char('>'))(input)
}

fn restrictions(input: &str) -> Result<RawMember> {
    let (input, _) = delimited(char('['), take_until("]"), char(']'))(input)?;
    Ok((input, RawMember::Open))
}

fn array_member(input: &str) -> Result<RawMember> {
    let (input, _) = tag("array")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, type_name) = identifier(input)?;
    let (input, _) = space(input)?;
    // Array names are never referenced by other members.
    let (input, _) = identifier(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char('[')(input)?;
    let (input, _) = space(input)?;
    let (input, size) = identifier(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char(']')(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char(';')(input)?;

    Ok((input, RawMember::Array { type_name, size }))
}

fn scalar_member(input: &str) -> Result<RawMember> {
    let (input, type_name) = identifier(input)?;
    let (input, _) = space(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char(';')(input)?;

    Ok((input, RawMember::Scalar { type_name, name }))
}

fn member(input: &str) -> Result<RawMember> {
    let (input, _) = space(input)?;
    alt((restrictions, array_member, scalar_member))(input)
}

fn template(input: &str) -> Result<RawTemplate> {
    let (input, _) = space(input)?;
    let (input, _) = opt(tag("template"))(input)?;
    let (input, _) = space(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char('{')(input)?;
    let (input, _) = space(input)?;
    let (input, _) = opt(guid)(input)?;
    let (input, members) = many0(member)(input)?;
    let (input, _) = space(input)?;
    let (input, _) = char('}')(input)?;

    Ok((input, RawTemplate { name, members }))
}

fn templates(input: &str) -> std::result::Result<Vec<RawTemplate>, TemplateGrammarError> {
    let (rest, raw_templates) = many0(template)(input).map_err(grammar_error)?;
    let (rest, _) = space(rest).map_err(grammar_error)?;

    if !rest.is_empty() {
        // Rerun the failing declaration to get a useful error.
        return Err(match template(rest) {
            Err(e) => grammar_error(e),
            Ok(_) => TemplateGrammarError::from_error_kind(rest, ErrorKind::Eof),
        });
    }

    Ok(raw_templates)
}

fn grammar_error(e: nom::Err<TemplateGrammarError>) -> TemplateGrammarError {
    match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => TemplateGrammarError::Syntax {
            near: String::new(),
            kind: ErrorKind::Eof,
        },
    }
}

fn primitive(type_name: &str) -> Option<Primitive> {
    match type_name {
        "WORD" | "DWORD" | "SWORD" | "SDWORD" | "CHAR" | "UCHAR" | "BYTE" => Some(Primitive::Int),
        "FLOAT" | "DOUBLE" => Some(Primitive::Float),
        "STRING" | "LPSTR" | "CSTRING" => Some(Primitive::String),
        _ => None,
    }
}

fn resolve(raw: &RawTemplate, known: &HashSet<&str>) -> std::result::Result<Template, TemplateGrammarError> {
    let template_name = raw.name.to_string();
    let unknown_type = |type_name: &str| TemplateGrammarError::UnknownType {
        template: template_name.clone(),
        type_name: type_name.to_string(),
    };

    let mut members = Vec::with_capacity(raw.members.len());
    for (index, member) in raw.members.iter().enumerate() {
        let spec = match member {
            RawMember::Open => {
                if index + 1 != raw.members.len() {
                    return Err(TemplateGrammarError::OpenMemberNotLast {
                        template: template_name.clone(),
                    });
                }
                MemberSpec::AnyRepeated
            }
            RawMember::Scalar { type_name, .. } => match primitive(type_name) {
                Some(p) => MemberSpec::Primitive(p),
                None if known.contains(type_name) => {
                    MemberSpec::InlineTemplate(type_name.to_string())
                }
                None => return Err(unknown_type(*type_name)),
            },
            RawMember::Array {
                type_name, size, ..
            } => {
                let element = match primitive(type_name) {
                    Some(Primitive::Int) => ElementKind::Int,
                    Some(Primitive::Float) => ElementKind::Float,
                    Some(Primitive::String) => {
                        return Err(TemplateGrammarError::UnsupportedArray {
                            template: template_name.clone(),
                            type_name: type_name.to_string(),
                        })
                    }
                    None if known.contains(type_name) => ElementKind::Template(type_name.to_string()),
                    None => return Err(unknown_type(*type_name)),
                };

                let size = match size.parse::<usize>() {
                    Ok(len) => SizeSource::Literal(len),
                    Err(_) => {
                        // Open members are always last, so member indices and data indices are the same.
                        let position = raw.members[..index].iter().rposition(|earlier| match earlier {
                            RawMember::Scalar { type_name, name } => {
                                name == size && primitive(type_name) == Some(Primitive::Int)
                            }
                            _ => false,
                        });

                        match position {
                            Some(position) => SizeSource::Member(position),
                            None => {
                                return Err(TemplateGrammarError::UnknownSizeMember {
                                    template: template_name.clone(),
                                    size: size.to_string(),
                                })
                            }
                        }
                    }
                };

                MemberSpec::Array(element, size)
            }
        };

        members.push(spec);
    }

    Ok(Template {
        name: template_name,
        members,
    })
}

/// Maps template names to their definitions. The registry is built once and only read afterwards, so it can be
/// shared between parses freely.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    //LinkedHashMap keeps the declaration order for `names`
    templates: LinkedHashMap<String, Template>,
}

impl TemplateRegistry {
    /// The registry of the standard templates, built on first use.
    pub fn standard() -> &'static TemplateRegistry {
        &STANDARD_REGISTRY
    }

    /// Builds a registry from template declarations. Templates may refer to each other in any order but every
    /// referenced name has to be declared in `grammar`. Prepend `STANDARD_TEMPLATES` to extend the standard set.
    pub fn from_grammar(grammar: &str) -> std::result::Result<Self, TemplateGrammarError> {
        let raw_templates = templates(grammar)?;
        let known: HashSet<&str> = raw_templates.iter().map(|t| t.name).collect();

        let mut registry = TemplateRegistry::default();
        for raw in &raw_templates {
            let template = resolve(raw, &known)?;
            if registry.templates.contains_key(&template.name) {
                return Err(TemplateGrammarError::Duplicate(template.name));
            }
            registry.templates.insert(template.name.clone(), template);
        }

        Ok(registry)
    }

    /// Never fails: names that aren't registered get an opaque template that skips whatever the object contains.
    pub fn lookup(&self, name: &str) -> Cow<'_, Template> {
        match self.templates.get(name) {
            Some(template) => Cow::Borrowed(template),
            None => Cow::Owned(Template::opaque(name)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
