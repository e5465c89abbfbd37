// src/tensor_ops.rs

use serde::{Deserialize, Serialize, Serializer};

// Error Handling
#[derive(Debug, PartialEq)]
pub enum TensorError {
    InvalidDimension(String),
    IrregularShape(String),
    PathNotFound(String),
}

impl std::fmt::Display for TensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorError::InvalidDimension(s) => write!(f, "Invalid dimension: {}", s),
            TensorError::IrregularShape(s) => write!(f, "Irregular shape: {}", s),
            TensorError::PathNotFound(s) => write!(f, "Path not found: {}", s),
        }
    }
}

impl std::error::Error for TensorError {}

/// A nested value tree: either a scalar leaf or an array of further tensors.
///
/// Nothing about the tree is validated on construction. Ragged or mixed
/// arrays are representable; `tensor_shape` is what decides regularity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Tensor {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Array(Vec<Tensor>),
}

// Largest integer an f64 holds exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for Tensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tensor::Null => serializer.serialize_unit(),
            Tensor::Bool(b) => serializer.serialize_bool(*b),
            // Integral numbers print without a trailing ".0"
            Tensor::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Tensor::Number(n) => serializer.serialize_f64(*n),
            Tensor::Text(s) => serializer.serialize_str(s),
            Tensor::Array(items) => serializer.collect_seq(items),
        }
    }
}

impl Tensor {
    pub fn is_array(&self) -> bool {
        matches!(self, Tensor::Array(_))
    }

    pub fn as_array(&self) -> Option<&Vec<Tensor>> {
        match self {
            Tensor::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Reads a 1-based path entry. Integral numbers are taken as-is and
    /// numeric text is converted the way a loosely typed host would.
    pub fn as_index(&self) -> Option<i64> {
        let n = match self {
            Tensor::Number(n) => *n,
            Tensor::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
            Some(n as i64)
        } else {
            None
        }
    }

    /// Strict primitive equality used by path search: both sides must be the
    /// same kind of scalar with equal value. Arrays never match, and `NaN`
    /// never equals itself.
    pub fn is_identical(&self, other: &Tensor) -> bool {
        match (self, other) {
            (Tensor::Null, Tensor::Null) => true,
            (Tensor::Bool(a), Tensor::Bool(b)) => a == b,
            (Tensor::Number(a), Tensor::Number(b)) => a == b,
            (Tensor::Text(a), Tensor::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for Tensor {
    fn from(n: f64) -> Self {
        Tensor::Number(n)
    }
}

impl From<bool> for Tensor {
    fn from(b: bool) -> Self {
        Tensor::Bool(b)
    }
}

impl From<&str> for Tensor {
    fn from(s: &str) -> Self {
        Tensor::Text(s.to_string())
    }
}

impl From<Vec<Tensor>> for Tensor {
    fn from(items: Vec<Tensor>) -> Self {
        Tensor::Array(items)
    }
}

/// Converts a list of dimension values into sizes. Every entry has to be an
/// integral number >= 1; text, booleans, NaN, fractions and zero are rejected.
pub fn parse_dims(dims: &[Tensor]) -> Result<Vec<usize>, TensorError> {
    dims.iter()
        .enumerate()
        .map(|(i, dim)| match dim {
            Tensor::Number(n) if n.is_finite() && *n >= 1.0 && n.fract() == 0.0 && *n < MAX_EXACT_INTEGER => {
                Ok(*n as usize)
            }
            other => Err(TensorError::InvalidDimension(format!(
                "entry {} ({:?}) is not a positive integer",
                i, other
            ))),
        })
        .collect()
}

/// Converts a list of path values into 1-based indices.
pub fn parse_path(path: &[Tensor]) -> Result<Vec<i64>, TensorError> {
    path.iter()
        .enumerate()
        .map(|(i, entry)| {
            entry.as_index().ok_or_else(|| {
                TensorError::PathNotFound(format!("path entry {} ({:?}) is not an index", i, entry))
            })
        })
        .collect()
}

fn ensure_positive(dims: &[usize]) -> Result<usize, TensorError> {
    let mut size: usize = 1;
    for (i, &dim) in dims.iter().enumerate() {
        if dim == 0 {
            return Err(TensorError::InvalidDimension(format!("entry {} is zero", i)));
        }
        size = size.checked_mul(dim).ok_or_else(|| {
            TensorError::InvalidDimension(format!("element count of {:?} overflows", dims))
        })?;
    }
    Ok(size)
}

/// Builds a regular tensor of shape `dims` with every leaf set to `fill`.
/// An empty `dims` yields `fill` itself.
pub fn create_tensor(dims: &[usize], fill: &Tensor) -> Result<Tensor, TensorError> {
    ensure_positive(dims)?;
    Ok(build_filled(dims, fill))
}

fn build_filled(dims: &[usize], fill: &Tensor) -> Tensor {
    match dims.split_first() {
        None => fill.clone(),
        Some((&len, rest)) => Tensor::Array((0..len).map(|_| build_filled(rest, fill)).collect()),
    }
}

/// Infers the shape of a tensor, one depth at a time.
///
/// Every node at a given depth must agree with the first one: all arrays of
/// the same length, or all scalars. Descent stops at a scalar level or at a
/// level of empty arrays. An empty root has shape `[0]` and a bare scalar has
/// the rank-0 shape `[]`.
pub fn tensor_shape(tensor: &Tensor) -> Result<Vec<usize>, TensorError> {
    let root = match tensor {
        Tensor::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    if root.is_empty() {
        return Ok(vec![0]);
    }

    let mut shape = vec![root.len()];
    let mut level: Vec<&Tensor> = root.iter().collect();

    loop {
        let expected = level[0].as_array().map(|items| items.len());
        for (i, node) in level.iter().enumerate().skip(1) {
            let found = node.as_array().map(|items| items.len());
            if found != expected {
                return Err(TensorError::IrregularShape(format!(
                    "node {} at depth {} is {} but node 0 is {}",
                    i,
                    shape.len(),
                    describe(found),
                    describe(expected)
                )));
            }
        }

        let len = match expected {
            Some(len) => len,
            None => break,
        };
        shape.push(len);
        if len == 0 {
            break;
        }

        let mut next = Vec::with_capacity(level.len() * len);
        for node in &level {
            if let Some(items) = node.as_array() {
                next.extend(items.iter());
            }
        }
        level = next;
    }

    Ok(shape)
}

fn describe(len: Option<usize>) -> String {
    match len {
        Some(len) => format!("an array of length {}", len),
        None => "a scalar".to_string(),
    }
}

/// Rank is the length of the inferred shape, so irregular trees have no rank.
pub fn tensor_rank(tensor: &Tensor) -> Result<usize, TensorError> {
    tensor_shape(tensor).map(|shape| shape.len())
}

/// True when `tensor` is an array and shape inference succeeds on it.
pub fn tensor_valid(tensor: &Tensor) -> bool {
    tensor.is_array() && tensor_shape(tensor).is_ok()
}

/// Counts scalar leaves, regardless of whether the tree is regular.
pub fn count_scalars(tensor: &Tensor) -> usize {
    let mut count = 0;
    let mut stack = vec![tensor];
    while let Some(node) = stack.pop() {
        match node {
            Tensor::Array(items) => stack.extend(items.iter()),
            _ => count += 1,
        }
    }
    count
}

/// Row-major list of every scalar leaf, at any depth.
pub fn flatten_tensor(tensor: &Tensor) -> Vec<Tensor> {
    let mut flat = Vec::new();
    let mut stack = vec![tensor];
    while let Some(node) = stack.pop() {
        match node {
            Tensor::Array(items) => stack.extend(items.iter().rev()),
            leaf => flat.push(leaf.clone()),
        }
    }
    flat
}

/// Flattens `tensor`, truncates or pads (with `Null`) to the element count
/// of `shape`, then refills `shape` innermost dimension first.
pub fn reshape_tensor(tensor: &Tensor, shape: &[usize]) -> Result<Tensor, TensorError> {
    if shape.is_empty() {
        return Err(TensorError::InvalidDimension("target shape is empty".to_string()));
    }
    let size = ensure_positive(shape)?;

    let mut flat = flatten_tensor(tensor);
    if size > flat.len() {
        flat.try_reserve_exact(size - flat.len()).map_err(|e| {
            TensorError::InvalidDimension(format!("cannot allocate {} elements: {}", size, e))
        })?;
    }
    flat.resize(size, Tensor::Null);
    let mut leaves = flat.into_iter();
    Ok(build_from(shape, &mut leaves))
}

fn build_from<I: Iterator<Item = Tensor>>(shape: &[usize], leaves: &mut I) -> Tensor {
    match shape.split_first() {
        None => leaves.next().unwrap_or(Tensor::Null),
        Some((&len, rest)) => {
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(build_from(rest, leaves));
            }
            Tensor::Array(items)
        }
    }
}

/// Replaces every leaf with `value`, keeping the array structure as-is.
/// Works on irregular trees too.
pub fn fill_tensor(tensor: &Tensor, value: &Tensor) -> Tensor {
    match tensor {
        Tensor::Array(items) => Tensor::Array(items.iter().map(|item| fill_tensor(item, value)).collect()),
        _ => value.clone(),
    }
}

fn zero_based(index: i64, len: usize) -> Option<usize> {
    if index >= 1 && (index as u64) <= len as u64 {
        Some(index as usize - 1)
    } else {
        None
    }
}

/// Follows a 1-based `path` from the root. An empty path selects the root.
pub fn get_tensor_path<'a>(tensor: &'a Tensor, path: &[i64]) -> Result<&'a Tensor, TensorError> {
    let mut current = tensor;
    for (depth, &index) in path.iter().enumerate() {
        let items = current.as_array().ok_or_else(|| {
            TensorError::PathNotFound(format!("node at depth {} is not an array", depth))
        })?;
        let slot = zero_based(index, items.len()).ok_or_else(|| {
            TensorError::PathNotFound(format!(
                "index {} at depth {} is outside 1..={}",
                index,
                depth,
                items.len()
            ))
        })?;
        current = &items[slot];
    }
    Ok(current)
}

/// Returns a copy of `tensor` with the element at `path` replaced by `value`.
///
/// Only the arrays along the path are rebuilt. If any step fails nothing is
/// built and the error is returned, so the caller never sees a half-updated tree.
pub fn set_tensor_path(tensor: &Tensor, path: &[i64], value: &Tensor) -> Result<Tensor, TensorError> {
    if path.is_empty() {
        return Err(TensorError::PathNotFound("path is empty".to_string()));
    }
    set_along(tensor, path, value, 0)
}

fn set_along(node: &Tensor, path: &[i64], value: &Tensor, depth: usize) -> Result<Tensor, TensorError> {
    let items = node.as_array().ok_or_else(|| {
        TensorError::PathNotFound(format!("node at depth {} is not an array", depth))
    })?;
    let (&index, rest) = match path.split_first() {
        Some(split) => split,
        None => return Ok(value.clone()),
    };
    let slot = zero_based(index, items.len()).ok_or_else(|| {
        TensorError::PathNotFound(format!(
            "index {} at depth {} is outside 1..={}",
            index,
            depth,
            items.len()
        ))
    })?;

    let replacement = if rest.is_empty() {
        value.clone()
    } else {
        set_along(&items[slot], rest, value, depth + 1)?
    };

    let mut rebuilt = Vec::with_capacity(items.len());
    rebuilt.extend_from_slice(&items[..slot]);
    rebuilt.push(replacement);
    rebuilt.extend_from_slice(&items[slot + 1..]);
    Ok(Tensor::Array(rebuilt))
}

/// Depth-first, left-to-right search for the first leaf identical to
/// `target`. Returns its 1-based path.
pub fn find_tensor_path(tensor: &Tensor, target: &Tensor) -> Option<Vec<usize>> {
    let mut stack: Vec<(&Tensor, Vec<usize>)> = vec![(tensor, Vec::new())];
    while let Some((node, path)) = stack.pop() {
        match node {
            Tensor::Array(items) => {
                // Pushed right to left so the leftmost child pops first
                for (i, item) in items.iter().enumerate().rev() {
                    let mut child = path.clone();
                    child.push(i + 1);
                    stack.push((item, child));
                }
            }
            leaf => {
                if leaf.is_identical(target) {
                    return Some(path);
                }
            }
        }
    }
    None
}

/// Whether any leaf is identical to `target`.
pub fn tensor_contains(tensor: &Tensor, target: &Tensor) -> bool {
    let mut stack = vec![tensor];
    while let Some(node) = stack.pop() {
        match node {
            Tensor::Array(items) => stack.extend(items.iter().rev()),
            leaf => {
                if leaf.is_identical(target) {
                    return true;
                }
            }
        }
    }
    false
}

/// Reverses the axis order of a regular tensor: the element at
/// `(i1, ..., ik)` moves to `(ik, ..., i1)`. Rank 0 and 1 come back unchanged.
pub fn transpose_tensor(tensor: &Tensor) -> Result<Tensor, TensorError> {
    let shape = tensor_shape(tensor)?;
    if shape.len() < 2 {
        return Ok(tensor.clone());
    }
    let reversed: Vec<usize> = shape.iter().rev().copied().collect();
    let mut index = vec![0; reversed.len()];
    build_transposed(tensor, &reversed, 0, &mut index)
}

fn build_transposed(
    source: &Tensor,
    out_shape: &[usize],
    depth: usize,
    index: &mut [usize],
) -> Result<Tensor, TensorError> {
    if depth == out_shape.len() {
        let mut current = source;
        for &i in index.iter().rev() {
            current = current.as_array().and_then(|items| items.get(i)).ok_or_else(|| {
                TensorError::IrregularShape(format!("no source element for output index {:?}", index))
            })?;
        }
        return Ok(current.clone());
    }

    let mut items = Vec::with_capacity(out_shape[depth]);
    for i in 0..out_shape[depth] {
        index[depth] = i;
        items.push(build_transposed(source, out_shape, depth + 1, index)?);
    }
    Ok(Tensor::Array(items))
}
