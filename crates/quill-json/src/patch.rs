//! RFC6902 operation lists and RFC7386 merge patches.
//!
//! Operation lists apply atomically: the document is only replaced after
//! every operation succeeded, so a failure mid-sequence leaves the caller's
//! tree bit-identical to its input.

use indexmap::IndexMap;

use crate::pointer::parse_index;
use crate::Error;
use crate::Pointer;
use crate::Result;
use crate::Value;

/// A parsed RFC6902 operation list.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

/// One RFC6902 operation.
///
/// `increment` is a non-standard extension: it adds an integer delta to an
/// integer target and fails on every other combination.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchOp {
    pub kind: PatchKind,
    pub path: Pointer,
    pub from: Option<Pointer>,
    pub value: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchKind {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
    Increment,
}

impl Patch {
    pub fn from_json(text: &str) -> Result<Patch> {
        Patch::from_value(&Value::from_json(text)?)
    }

    /// Validate a patch document: an array of operation objects.
    pub fn from_value(spec: &Value) -> Result<Patch> {
        let items = spec
            .as_array()
            .ok_or_else(|| Error::PatchInvalid("patch must be an array of operations".into()))?;
        let ops = items
            .iter()
            .map(PatchOp::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Patch { ops })
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }
}

impl PatchOp {
    fn from_value(spec: &Value) -> Result<PatchOp> {
        let fields = spec
            .as_object()
            .ok_or_else(|| Error::PatchInvalid("operation must be an object".into()))?;
        let op = fields
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::PatchInvalid("missing `op` member".into()))?;
        let kind = match op {
            "add" => PatchKind::Add,
            "remove" => PatchKind::Remove,
            "replace" => PatchKind::Replace,
            "copy" => PatchKind::Copy,
            "move" => PatchKind::Move,
            "test" => PatchKind::Test,
            "increment" => PatchKind::Increment,
            other => {
                return Err(Error::PatchInvalid(format!("unknown operation {other:?}")));
            }
        };
        let path = fields
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::PatchInvalid("missing `path` member".into()))?;
        let path = Pointer::parse(path)?;
        let from = match kind {
            PatchKind::Copy | PatchKind::Move => {
                let from = fields
                    .get("from")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::PatchInvalid("missing `from` member".into()))?;
                Some(Pointer::parse(from)?)
            }
            _ => None,
        };
        let value = match kind {
            PatchKind::Add | PatchKind::Replace | PatchKind::Test | PatchKind::Increment => {
                let value = fields
                    .get("value")
                    .ok_or_else(|| Error::PatchInvalid("no value specified".into()))?;
                Some(value.clone())
            }
            _ => None,
        };
        Ok(PatchOp {
            kind,
            path,
            from,
            value,
        })
    }
}

impl Value {
    /// Apply an operation list. Atomic: on any failure the document is left
    /// untouched.
    pub fn patch(&mut self, patch: &Patch) -> Result<()> {
        let mut work = self.clone();
        for op in patch.ops() {
            apply_op(&mut work, op)?;
        }
        *self = work;
        Ok(())
    }

    /// Parse and apply an operation list in one step.
    pub fn patch_from_json(&mut self, text: &str) -> Result<()> {
        self.patch(&Patch::from_json(text)?)
    }

    /// Apply an RFC7386 merge patch. Null members remove target keys,
    /// objects recurse, everything else replaces; a non-object patch
    /// replaces the whole document. Idempotent.
    pub fn merge_patch(&mut self, patch: &Value) {
        merge_in_place(self, patch);
    }

    /// Dispatch on the patch document shape: an array is an RFC6902
    /// operation list, an object is a merge patch.
    pub fn patch_auto(&mut self, spec: &Value) -> Result<()> {
        match spec {
            Value::Array(_) => self.patch(&Patch::from_value(spec)?),
            Value::Object(_) => {
                self.merge_patch(spec);
                Ok(())
            }
            _ => Err(Error::PatchInvalid(
                "patch must be an array or an object".into(),
            )),
        }
    }
}

fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<()> {
    match op.kind {
        PatchKind::Add => add(doc, &op.path, required_value(op)?),
        PatchKind::Remove => remove(doc, &op.path).map(drop),
        PatchKind::Replace => {
            let target = doc.resolve_mut(&op.path)?;
            *target = required_value(op)?;
            Ok(())
        }
        PatchKind::Copy => {
            let from = required_from(op)?;
            let value = doc.resolve(from)?.clone();
            add(doc, &op.path, value)
        }
        PatchKind::Move => {
            let from = required_from(op)?;
            if from.is_prefix_of(&op.path) && from != &op.path {
                return Err(Error::PatchTargetInvalid(op.path.as_str().to_string()));
            }
            let value = remove(doc, from)?;
            add(doc, &op.path, value)
        }
        PatchKind::Test => {
            let target = doc.resolve(&op.path)?;
            let expected = required_value(op)?;
            if target.structural_eq(&expected) {
                Ok(())
            } else {
                Err(Error::PatchTestFailed(op.path.as_str().to_string()))
            }
        }
        PatchKind::Increment => {
            let delta = required_value(op)?;
            let target = doc.resolve_mut(&op.path)?;
            let (Value::Int(a), Value::Int(b)) = (&*target, &delta) else {
                return Err(Error::PatchInvalid(
                    "increment requires an integer target and an integer delta".into(),
                ));
            };
            let sum = a
                .checked_add(*b)
                .ok_or_else(|| Error::PatchInvalid("increment overflows".into()))?;
            *target = Value::Int(sum);
            Ok(())
        }
    }
}

fn required_value(op: &PatchOp) -> Result<Value> {
    op.value
        .clone()
        .ok_or_else(|| Error::PatchInvalid("no value specified".into()))
}

fn required_from(op: &PatchOp) -> Result<&Pointer> {
    op.from
        .as_ref()
        .ok_or_else(|| Error::PatchInvalid("missing `from` member".into()))
}

fn add(doc: &mut Value, path: &Pointer, value: Value) -> Result<()> {
    let Some((parent_path, last)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    let mut parent = doc;
    for segment in parent_path {
        parent = match parent {
            Value::Object(fields) => fields.get_mut(segment),
            Value::Array(items) => parse_index(segment).and_then(|i| items.get_mut(i)),
            _ => None,
        }
        .ok_or_else(|| Error::PatchTargetInvalid(path.as_str().to_string()))?;
    }
    match parent {
        Value::Object(fields) => {
            fields.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            match parse_index(last) {
                Some(i) if i <= items.len() => {
                    items.insert(i, value);
                    Ok(())
                }
                _ => Err(Error::PatchInvalidArrayIndex(path.as_str().to_string())),
            }
        }
        _ => Err(Error::PatchTargetInvalid(path.as_str().to_string())),
    }
}

fn remove(doc: &mut Value, path: &Pointer) -> Result<Value> {
    if path.is_root() {
        return Err(Error::PatchTargetInvalid(path.as_str().to_string()));
    }
    doc.detach(path)
}

fn merge_in_place(target: &mut Value, patch: &Value) {
    let Value::Object(fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !matches!(target, Value::Object(_)) {
        *target = Value::Object(IndexMap::new());
    }
    if let Value::Object(map) = target {
        for (key, pv) in fields {
            if pv.is_null() {
                map.shift_remove(key);
            } else if let Some(existing) = map.get_mut(key) {
                merge_in_place(existing, pv);
            } else {
                map.insert(key.clone(), merge_fresh(pv));
            }
        }
    }
}

/// A merge patch applied to nothing: objects lose their null members.
fn merge_fresh(patch: &Value) -> Value {
    match patch {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), merge_fresh(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
