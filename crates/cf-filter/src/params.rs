//! Filter parameter tuples and the domains they are enumerated from.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::FilterError;

/// Concrete parameter vector identifying one filter instance.
///
/// Equality and hashing use the exact bit pattern of every value, so two
/// params are equal only when they build bit-identical kernels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams(Vec<f32>);

impl FilterParams {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self(values.into())
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f32> {
        self.0.get(i).copied()
    }
}

impl PartialEq for FilterParams {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for FilterParams {}

impl Hash for FilterParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for v in &self.0 {
            v.to_bits().hash(state);
        }
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<f32>> for FilterParams {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// One dimension of a filter argument domain.
///
/// Deserializes from either a number (`2.4`) or a list (`[1.8, 2.4]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgDimension {
    Fixed(f32),
    List(Vec<f32>),
}

impl ArgDimension {
    fn values(&self) -> &[f32] {
        match self {
            Self::Fixed(v) => std::slice::from_ref(v),
            Self::List(vs) => vs,
        }
    }
}

/// Ordered list of argument dimensions, expanded by Cartesian product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterArgumentDomain {
    dims: Vec<ArgDimension>,
}

impl FilterArgumentDomain {
    pub fn new(dims: Vec<ArgDimension>) -> Self {
        Self { dims }
    }

    /// Domain with a single point: every dimension fixed.
    pub fn fixed(values: &[f32]) -> Self {
        Self {
            dims: values.iter().copied().map(ArgDimension::Fixed).collect(),
        }
    }

    pub fn dims(&self) -> &[ArgDimension] {
        &self.dims
    }

    /// Concrete parameter tuples, first dimension outermost.
    pub fn expand(&self) -> Result<Vec<FilterParams>, FilterError> {
        if self.dims.is_empty() || self.dims.iter().any(|d| d.values().is_empty()) {
            return Err(FilterError::EmptyDomain);
        }

        let mut combos: Vec<Vec<f32>> = vec![Vec::with_capacity(self.dims.len())];
        for dim in &self.dims {
            combos = combos
                .iter()
                .flat_map(|prefix| {
                    dim.values().iter().map(move |&v| {
                        let mut next = prefix.clone();
                        next.push(v);
                        next
                    })
                })
                .collect();
        }

        Ok(combos.into_iter().map(FilterParams).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{ArgDimension, FilterArgumentDomain, FilterParams};
    use crate::FilterError;

    #[test]
    fn expand_is_cartesian_first_dim_outermost() {
        let domain = FilterArgumentDomain::new(vec![
            ArgDimension::List(vec![1.0, 2.0]),
            ArgDimension::Fixed(1.0),
            ArgDimension::List(vec![0.25, 0.5, 0.75]),
        ]);
        let params = domain.expand().expect("non-empty domain");

        assert_eq!(params.len(), 6);
        assert_eq!(params[0].values(), &[1.0, 1.0, 0.25]);
        assert_eq!(params[2].values(), &[1.0, 1.0, 0.75]);
        assert_eq!(params[3].values(), &[2.0, 1.0, 0.25]);
    }

    #[test]
    fn empty_domains_are_rejected() {
        assert_eq!(
            FilterArgumentDomain::default().expand(),
            Err(FilterError::EmptyDomain)
        );
        let domain = FilterArgumentDomain::new(vec![
            ArgDimension::Fixed(2.4),
            ArgDimension::List(Vec::new()),
        ]);
        assert_eq!(domain.expand(), Err(FilterError::EmptyDomain));
    }

    #[test]
    fn params_hash_by_bits() {
        let mut set = HashSet::new();
        set.insert(FilterParams::new(vec![2.4, 1.0]));
        set.insert(FilterParams::new(vec![2.4, 1.0]));
        set.insert(FilterParams::new(vec![2.4]));
        assert_eq!(set.len(), 2);
        assert_eq!(FilterParams::new(vec![1.8, 1.0]).to_string(), "(1.8, 1)");
    }

    #[test]
    fn domain_deserializes_scalars_and_lists() {
        let domain: FilterArgumentDomain =
            serde_json::from_str("[[1.8, 2.4], 1]").expect("valid json");
        assert_eq!(
            domain.dims(),
            &[ArgDimension::List(vec![1.8, 2.4]), ArgDimension::Fixed(1.0)]
        );
        assert_eq!(domain.expand().expect("non-empty").len(), 2);
    }
}
