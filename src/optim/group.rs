//! Parameter groups and backbone/classifier partitioning

use crate::{Error, Result, Tensor};

/// A subset of trainable parameters assigned a distinct learning rate
#[derive(Clone)]
pub struct ParamGroup {
    /// Group name, for diagnostics
    pub name: &'static str,
    /// The parameters (aliases of the model's tensors)
    pub params: Vec<Tensor>,
    /// Learning rate for this group
    pub lr: f32,
}

impl ParamGroup {
    /// Create a parameter group, rejecting empty membership
    pub fn new(name: &'static str, params: Vec<Tensor>, lr: f32) -> Result<Self> {
        if params.is_empty() {
            return Err(Error::EmptyParameterGroup {
                group: name,
                detail: "optimizer groups must contain at least one parameter".to_string(),
            });
        }
        Ok(Self { name, params, lr })
    }
}

impl std::fmt::Debug for ParamGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamGroup")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .field("lr", &self.lr)
            .finish()
    }
}

/// Whether a named parameter belongs to the backbone group
///
/// Membership in the classifier group is keyed on the name containing the
/// substring `"classifier"`; everything else is backbone.
pub fn is_backbone_param(name: &str) -> bool {
    !name.contains("classifier")
}

/// Split named parameters into (backbone, classifier) groups
///
/// Every parameter lands in exactly one of the two partitions.
pub fn partition_by_classifier(named: &[(String, Tensor)]) -> (Vec<Tensor>, Vec<Tensor>) {
    let mut backbone = Vec::new();
    let mut classifier = Vec::new();
    for (name, param) in named {
        if is_backbone_param(name) {
            backbone.push(param.clone());
        } else {
            classifier.push(param.clone());
        }
    }
    (backbone, classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<(String, Tensor)> {
        names
            .iter()
            .map(|n| (n.to_string(), Tensor::zeros(2, true)))
            .collect()
    }

    #[test]
    fn test_is_backbone_param() {
        assert!(is_backbone_param("encoder.layer.0.attention.weight"));
        assert!(!is_backbone_param("classifier.weight"));
        assert!(!is_backbone_param("model.classifier.bias"));
    }

    #[test]
    fn test_partition_strict_bipartition() {
        let params = named(&[
            "embeddings.word_embeddings.weight",
            "encoder.layer.0.output.dense.weight",
            "classifier.weight",
            "classifier.bias",
        ]);
        let (backbone, classifier) = partition_by_classifier(&params);
        assert_eq!(backbone.len(), 2);
        assert_eq!(classifier.len(), 2);
        assert_eq!(backbone.len() + classifier.len(), params.len());
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = ParamGroup::new("classifier", vec![], 1e-3).unwrap_err();
        assert!(err.to_string().contains("classifier"));
    }

    #[test]
    fn test_group_construction() {
        let group = ParamGroup::new("backbone", vec![Tensor::zeros(3, true)], 2e-5).unwrap();
        assert_eq!(group.params.len(), 1);
        assert_eq!(group.lr, 2e-5);
    }

    mod partition_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Every generated parameter name lands in exactly one group,
            // and classifier membership ⇔ name contains "classifier".
            #[test]
            fn partition_is_exhaustive_and_exclusive(
                names in proptest::collection::vec("[a-z.]{1,20}(classifier)?[a-z.]{0,10}", 1..24)
            ) {
                let params: Vec<(String, Tensor)> = names
                    .iter()
                    .map(|n| (n.clone(), Tensor::zeros(1, true)))
                    .collect();
                let (backbone, classifier) = partition_by_classifier(&params);
                prop_assert_eq!(backbone.len() + classifier.len(), params.len());

                let expected_classifier =
                    names.iter().filter(|n| n.contains("classifier")).count();
                prop_assert_eq!(classifier.len(), expected_classifier);
            }
        }
    }
}
