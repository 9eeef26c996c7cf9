//! Synthesized class files and jars for tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

#[derive(Debug, Clone)]
pub struct Annotation {
    type_name: String,
    class_value: Option<String>,
}

impl Annotation {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            class_value: None,
        }
    }

    pub fn with_class_value(type_name: &str, value: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            class_value: Some(value.to_string()),
        }
    }

    fn encode(&self, pool: &mut Pool) -> Vec<u8> {
        let mut out = Vec::new();
        push_u2(&mut out, pool.utf8(&format!("L{};", self.type_name)));
        match &self.class_value {
            None => push_u2(&mut out, 0),
            Some(value) => {
                push_u2(&mut out, 1);
                push_u2(&mut out, pool.utf8("value"));
                out.push(b'c');
                push_u2(&mut out, pool.utf8(&format!("L{value};")));
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    class_annotations: Vec<Annotation>,
    methods: Vec<(String, Vec<Annotation>)>,
}

impl ClassFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: ACC_PUBLIC | ACC_SUPER,
            class_annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn super_name(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_string());
        self
    }

    pub fn root(mut self) -> Self {
        self.super_name = None;
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn abstract_class(self) -> Self {
        let access = self.access | ACC_ABSTRACT;
        self.access(access)
    }

    pub fn interface_type(self) -> Self {
        self.access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    pub fn class_annotation(mut self, annotation: Annotation) -> Self {
        self.class_annotations.push(annotation);
        self
    }

    pub fn method(mut self, name: &str, annotations: &[Annotation]) -> Self {
        self.methods.push((name.to_string(), annotations.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_index = pool.class(&self.name);
        let super_index = self.super_name.as_deref().map_or(0, |s| pool.class(s));
        let interface_indices: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();
        pool.long(42);

        let code_name = pool.utf8("Code");
        let annotations_name = pool.utf8("RuntimeVisibleAnnotations");
        let void_descriptor = pool.utf8("()V");
        let field_name = pool.utf8("counter");
        let field_descriptor = pool.utf8("I");
        let deprecated_name = pool.utf8("Deprecated");
        let source_file_name = pool.utf8("SourceFile");
        let source_file = pool.utf8("Fixture.java");

        let methods: Vec<(u16, Vec<Vec<u8>>)> = self
            .methods
            .iter()
            .map(|(name, annotations)| {
                let name_index = pool.utf8(name);
                let encoded = annotations.iter().map(|a| a.encode(&mut pool)).collect();
                (name_index, encoded)
            })
            .collect();
        let class_annotations: Vec<Vec<u8>> = self
            .class_annotations
            .iter()
            .map(|a| a.encode(&mut pool))
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        push_u2(&mut out, 0);
        push_u2(&mut out, 52);
        push_u2(&mut out, pool.slots + 1);
        out.extend_from_slice(&pool.bytes);

        push_u2(&mut out, self.access);
        push_u2(&mut out, this_index);
        push_u2(&mut out, super_index);
        push_u2(&mut out, interface_indices.len() as u16);
        for index in interface_indices {
            push_u2(&mut out, index);
        }

        push_u2(&mut out, 1);
        push_u2(&mut out, 0x0002);
        push_u2(&mut out, field_name);
        push_u2(&mut out, field_descriptor);
        push_u2(&mut out, 1);
        push_u2(&mut out, deprecated_name);
        out.extend_from_slice(&0u32.to_be_bytes());

        push_u2(&mut out, methods.len() as u16);
        for (name_index, annotations) in methods {
            push_u2(&mut out, ACC_PUBLIC);
            push_u2(&mut out, name_index);
            push_u2(&mut out, void_descriptor);
            push_u2(&mut out, if annotations.is_empty() { 1 } else { 2 });

            // max_stack, max_locals, code_length, `return`, empty tables
            let code: [u8; 13] = [0, 1, 0, 1, 0, 0, 0, 1, 0xb1, 0, 0, 0, 0];
            push_u2(&mut out, code_name);
            out.extend_from_slice(&(code.len() as u32).to_be_bytes());
            out.extend_from_slice(&code);

            if !annotations.is_empty() {
                push_annotations(&mut out, annotations_name, &annotations);
            }
        }

        push_u2(&mut out, if class_annotations.is_empty() { 1 } else { 2 });
        push_u2(&mut out, source_file_name);
        out.extend_from_slice(&2u32.to_be_bytes());
        push_u2(&mut out, source_file);
        if !class_annotations.is_empty() {
            push_annotations(&mut out, annotations_name, &class_annotations);
        }

        out
    }
}

#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    slots: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Pool {
    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        let encoded = modified_utf8(value);
        self.bytes.push(1);
        push_u2(&mut self.bytes, encoded.len() as u16);
        self.bytes.extend_from_slice(&encoded);
        self.slots += 1;
        self.utf8.insert(value.to_string(), self.slots);
        self.slots
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        self.bytes.push(7);
        push_u2(&mut self.bytes, name_index);
        self.slots += 1;
        self.classes.insert(name.to_string(), self.slots);
        self.slots
    }

    fn long(&mut self, value: i64) {
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.slots += 2;
    }
}

/// Encodes text the way `javac` writes `CONSTANT_Utf8` entries.
fn modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn push_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_annotations(out: &mut Vec<u8>, attribute_name: u16, annotations: &[Vec<u8>]) {
    let length: usize = 2 + annotations.iter().map(Vec::len).sum::<usize>();
    push_u2(out, attribute_name);
    out.extend_from_slice(&(length as u32).to_be_bytes());
    push_u2(out, annotations.len() as u16);
    for annotation in annotations {
        out.extend_from_slice(annotation);
    }
}

/// Writes the class under `root` at `<internal name>.class` and returns its path.
pub fn write_class(root: &Path, class: &ClassFileBuilder) -> PathBuf {
    let path = root.join(format!("{}.class", class.name()));
    write_bytes(&path, &class.build());
    path
}

pub fn write_bytes(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

pub fn write_jar(path: &Path, classes: &[&ClassFileBuilder]) {
    let entries: Vec<(String, Vec<u8>)> = classes
        .iter()
        .map(|c| (format!("{}.class", c.name()), c.build()))
        .collect();
    write_jar_entries(path, &entries);
}

pub fn write_jar_entries(path: &Path, entries: &[(String, Vec<u8>)]) {
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}
