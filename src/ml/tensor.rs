//! Dense `f32` landmark tensor parsed from nested JSON arrays.
//!
//! The client sends landmarks as arbitrarily nested numeric arrays
//! (`[60][126]` or `[60][21][6]`). Parsing validates that the nesting is
//! rectangular and numeric, so later stages only deal with shapes.

use serde_json::Value;

use crate::error::{Result, ServeError};

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkTensor {
    shape: Vec<usize>,
    /// Row-major values, `data.len() == shape.iter().product()`.
    data: Vec<f32>,
}

impl LandmarkTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ServeError::Internal(format!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Parse a nested JSON array into a tensor.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut shape = Vec::new();
        let mut cursor = value;
        while let Value::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }
        if shape.is_empty() {
            return Err(ServeError::Validation(
                "landmarks must be a numeric array".to_string(),
            ));
        }

        // Grow with the values actually present: the shape read above only
        // follows first entries and is not trusted until every row matches.
        let mut data = Vec::new();
        collect_values(value, &shape, 0, &mut data)?;
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<f32>) {
        (self.shape, self.data)
    }

    /// Reinterpret the same contiguous values under a new shape.
    ///
    /// Returns `None` when the element counts differ.
    pub fn reshaped(self, shape: Vec<usize>) -> Option<Self> {
        if shape.iter().product::<usize>() != self.data.len() {
            return None;
        }
        Some(Self {
            shape,
            data: self.data,
        })
    }
}

fn collect_values(value: &Value, shape: &[usize], depth: usize, out: &mut Vec<f32>) -> Result<()> {
    if depth == shape.len() {
        return match value.as_f64() {
            Some(v) => {
                out.push(v as f32);
                Ok(())
            }
            None => Err(ServeError::Validation(format!(
                "landmarks must contain only numbers, found {value}"
            ))),
        };
    }

    let Value::Array(items) = value else {
        return Err(ServeError::Validation(format!(
            "landmarks are not rectangular: expected an array at depth {depth}"
        )));
    };
    if items.len() != shape[depth] {
        return Err(ServeError::Validation(format!(
            "landmarks are not rectangular: expected {} entries at depth {depth}, got {}",
            shape[depth],
            items.len()
        )));
    }
    for item in items {
        collect_values(item, shape, depth + 1, out)?;
    }
    Ok(())
}
