//! Structural class-file reader.
//!
//! Reads only what test detection needs: the class and superclass names, the
//! implemented interfaces, the access flags, and the annotation types attached to
//! the class and to its methods. Fields, method bodies, debug tables and stack-map
//! frames are skipped by length without being decoded.

use std::collections::BTreeSet;
use thiserror::Error;

pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

const MAGIC: u32 = 0xCAFEBABE;
const ANNOTATION_ATTRIBUTES: [&str; 2] = ["RuntimeVisibleAnnotations", "RuntimeInvisibleAnnotations"];

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("class file ends early at byte {offset}")]
    Truncated { offset: usize },
    #[error("not a class file (magic {magic:#010x})")]
    NotAClassFile { magic: u32 },
    #[error("unknown constant pool tag {tag} at entry {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("constant pool entry {index} is not a {expected}")]
    WrongConstantKind { index: u16, expected: &'static str },
    #[error("constant pool entry {index} is not valid modified UTF-8")]
    InvalidModifiedUtf8 { index: u16 },
    #[error("malformed annotation: {0}")]
    InvalidAnnotation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStructure {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access_flags: u16,
    pub annotations: BTreeSet<String>,
    pub method_annotations: BTreeSet<String>,
}

pub fn read_structure(bytes: &[u8]) -> Result<ClassStructure, ClassParseError> {
    let mut cursor = ByteCursor::new(bytes);
    let magic = cursor.u32()?;
    if magic != MAGIC {
        return Err(ClassParseError::NotAClassFile { magic });
    }
    cursor.skip(4)?; // minor and major version
    let pool = ConstantPool::read(&mut cursor)?;

    let access_flags = cursor.u16()?;
    let this_class = cursor.u16()?;
    let super_class = cursor.u16()?;

    let interface_count = cursor.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(cursor.u16()?)?.to_string());
    }

    for _ in 0..cursor.u16()? {
        skip_field(&mut cursor)?;
    }

    let mut method_annotations = BTreeSet::new();
    for _ in 0..cursor.u16()? {
        cursor.skip(6)?; // access, name and descriptor indices
        collect_annotations(&mut cursor, &pool, &mut method_annotations)?;
    }

    let mut annotations = BTreeSet::new();
    collect_annotations(&mut cursor, &pool, &mut annotations)?;

    // java/lang/Object and module-info carry no superclass
    let super_name = match super_class {
        0 => None,
        index => Some(pool.class_name(index)?.to_string()),
    };

    Ok(ClassStructure {
        name: pool.class_name(this_class)?.to_string(),
        super_name,
        interfaces,
        access_flags,
        annotations,
        method_annotations,
    })
}

/// Converts an annotation type descriptor such as `Lorg/junit/Test;` to its
/// internal name `org/junit/Test`.
pub fn annotation_type_name(descriptor: &str) -> Result<String, ClassParseError> {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ClassParseError::InvalidAnnotation(format!("type descriptor {descriptor:?}"))
        })
}

/// Reads an attribute table and records the types of its runtime annotations.
fn collect_annotations(
    cursor: &mut ByteCursor<'_>,
    pool: &ConstantPool,
    into: &mut BTreeSet<String>,
) -> Result<(), ClassParseError> {
    for _ in 0..cursor.u16()? {
        let name = pool.text(cursor.u16()?)?;
        let length = cursor.u32()? as usize;
        let body = cursor.take(length)?;
        if !ANNOTATION_ATTRIBUTES.contains(&name) {
            continue;
        }

        let mut annotations = ByteCursor::new(body);
        for _ in 0..annotations.u16()? {
            let type_index = annotations.u16()?;
            skip_element_pairs(&mut annotations)?;
            into.insert(annotation_type_name(pool.text(type_index)?)?);
        }
    }
    Ok(())
}

fn skip_element_pairs(cursor: &mut ByteCursor<'_>) -> Result<(), ClassParseError> {
    for _ in 0..cursor.u16()? {
        cursor.skip(2)?; // element_name_index
        skip_element_value(cursor)?;
    }
    Ok(())
}

fn skip_element_value(cursor: &mut ByteCursor<'_>) -> Result<(), ClassParseError> {
    match cursor.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => cursor.skip(2),
        b'e' => cursor.skip(4),
        b'@' => {
            cursor.skip(2)?;
            skip_element_pairs(cursor)
        }
        b'[' => {
            for _ in 0..cursor.u16()? {
                skip_element_value(cursor)?;
            }
            Ok(())
        }
        tag => Err(ClassParseError::InvalidAnnotation(format!(
            "element value tag {:?} at byte {}",
            tag as char,
            cursor.offset() - 1
        ))),
    }
}

fn skip_field(cursor: &mut ByteCursor<'_>) -> Result<(), ClassParseError> {
    cursor.skip(6)?;
    for _ in 0..cursor.u16()? {
        cursor.skip(2)?;
        let length = cursor.u32()? as usize;
        cursor.skip(length)?;
    }
    Ok(())
}

/// Decodes the JVM's modified UTF-8, where NUL is written as `C0 80` and a
/// supplementary character as two three-byte surrogate sequences.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut rest = bytes;
    while let Some((&lead, tail)) = rest.split_first() {
        let (unit, used) = match lead {
            0x01..=0x7F => (u16::from(lead), 0),
            0xC0..=0xDF => ((u16::from(lead & 0x1F) << 6) | continuation(tail, 0)?, 1),
            0xE0..=0xEF => (
                (u16::from(lead & 0x0F) << 12)
                    | (continuation(tail, 0)? << 6)
                    | continuation(tail, 1)?,
                2,
            ),
            _ => return None,
        };
        units.push(unit);
        rest = &tail[used..];
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], at: usize) -> Option<u16> {
    bytes
        .get(at)
        .filter(|b| *b & 0xC0 == 0x80)
        .map(|b| u16::from(b & 0x3F))
}

#[derive(Debug, Clone)]
enum PoolEntry {
    Text(String),
    UndecodableText,
    ClassRef(u16),
    Skipped,
    Gap,
}

struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ClassParseError> {
        let count = cursor.u16()?;
        let mut entries = vec![PoolEntry::Gap];

        while entries.len() < count as usize {
            let index = entries.len() as u16;
            let entry = match cursor.u8()? {
                1 => {
                    let length = cursor.u16()? as usize;
                    decode_modified_utf8(cursor.take(length)?)
                        .map_or(PoolEntry::UndecodableText, PoolEntry::Text)
                }
                7 => PoolEntry::ClassRef(cursor.u16()?),
                5 | 6 => {
                    // long and double take the following slot too
                    cursor.skip(8)?;
                    entries.push(PoolEntry::Skipped);
                    PoolEntry::Gap
                }
                tag => {
                    let width = match tag {
                        8 | 16 | 19 | 20 => 2,
                        15 => 3,
                        3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => 4,
                        _ => return Err(ClassParseError::UnknownConstantTag { tag, index }),
                    };
                    cursor.skip(width)?;
                    PoolEntry::Skipped
                }
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn text(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.entries.get(index as usize) {
            Some(PoolEntry::Text(value)) => Ok(value.as_str()),
            Some(PoolEntry::UndecodableText) => Err(ClassParseError::InvalidModifiedUtf8 { index }),
            _ => Err(ClassParseError::WrongConstantKind {
                index,
                expected: "Utf8 constant",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.entries.get(index as usize) {
            Some(PoolEntry::ClassRef(name_index)) => self.text(*name_index),
            _ => Err(ClassParseError::WrongConstantKind {
                index,
                expected: "Class constant",
            }),
        }
    }
}

/// Big-endian reader over a borrowed class file.
struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let start = self.offset;
        let chunk = start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(ClassParseError::Truncated {
                offset: self.bytes.len(),
            })?;
        self.offset += len;
        Ok(chunk)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ClassParseError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.take(len).map(drop)
    }

    fn u8(&mut self) -> Result<u8, ClassParseError> {
        Ok(self.take_array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassParseError> {
        self.take_array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32, ClassParseError> {
        self.take_array().map(u32::from_be_bytes)
    }
}
