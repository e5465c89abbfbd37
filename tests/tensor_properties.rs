use lx_tensors::tensor_ops::*;
use proptest::prelude::*;

fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..5)
}

// A regular tensor together with its shape, built from random integer leaves.
fn regular_tensor() -> impl Strategy<Value = (Vec<usize>, Tensor)> {
    dims_strategy()
        .prop_flat_map(|dims| {
            let size: usize = dims.iter().product();
            (Just(dims), prop::collection::vec(-20i32..20, size))
        })
        .prop_map(|(dims, leaves)| {
            let flat = Tensor::Array(leaves.into_iter().map(|n| Tensor::Number(n as f64)).collect());
            let tensor = reshape_tensor(&flat, &dims).expect("dims are positive");
            (dims, tensor)
        })
}

// A regular tensor plus a valid 1-based path into one of its leaves.
fn tensor_with_path() -> impl Strategy<Value = (Tensor, Vec<i64>)> {
    regular_tensor().prop_flat_map(|(dims, tensor)| {
        let path: Vec<_> = dims.iter().map(|&d| 1..=d as i64).collect();
        (Just(tensor), path)
    })
}

proptest! {
    #[test]
    fn created_tensor_has_requested_shape(dims in dims_strategy()) {
        let tensor = create_tensor(&dims, &Tensor::Null).unwrap();
        prop_assert_eq!(tensor_shape(&tensor).unwrap(), dims);
    }

    #[test]
    fn leaf_count_matches_shape_product((dims, tensor) in regular_tensor()) {
        let shape = tensor_shape(&tensor).unwrap();
        prop_assert_eq!(&shape, &dims);
        prop_assert_eq!(count_scalars(&tensor), shape.iter().product::<usize>());
    }

    #[test]
    fn transpose_is_an_involution((dims, tensor) in regular_tensor()) {
        let once = transpose_tensor(&tensor).unwrap();
        let mut reversed = dims.clone();
        reversed.reverse();
        prop_assert_eq!(tensor_shape(&once).unwrap(), reversed);
        prop_assert_eq!(transpose_tensor(&once).unwrap(), tensor);
    }

    #[test]
    fn reshape_preserves_leaf_order((dims, tensor) in regular_tensor()) {
        let mut target = dims.clone();
        target.reverse();
        let reshaped = reshape_tensor(&tensor, &target).unwrap();
        prop_assert_eq!(tensor_shape(&reshaped).unwrap(), target);
        prop_assert_eq!(flatten_tensor(&reshaped), flatten_tensor(&tensor));

        let flat = reshape_tensor(&tensor, &[count_scalars(&tensor)]).unwrap();
        prop_assert_eq!(Tensor::Array(flatten_tensor(&tensor)), flat);
    }

    #[test]
    fn fill_keeps_shape_and_sets_every_leaf((_dims, tensor) in regular_tensor()) {
        let value = Tensor::Text("v".to_string());
        let filled = fill_tensor(&tensor, &value);
        prop_assert_eq!(tensor_shape(&filled).unwrap(), tensor_shape(&tensor).unwrap());
        prop_assert!(flatten_tensor(&filled).iter().all(|leaf| *leaf == value));
    }

    #[test]
    fn set_then_get_returns_value((tensor, path) in tensor_with_path()) {
        let value = Tensor::Text("marker".to_string());
        let updated = set_tensor_path(&tensor, &path, &value).unwrap();
        prop_assert_eq!(get_tensor_path(&updated, &path).unwrap(), &value);
        prop_assert_eq!(tensor_shape(&updated).unwrap(), tensor_shape(&tensor).unwrap());
    }

    #[test]
    fn found_path_resolves_to_target((tensor, path) in tensor_with_path()) {
        let target = get_tensor_path(&tensor, &path).unwrap().clone();
        let found = find_tensor_path(&tensor, &target).expect("target is a leaf of the tensor");
        let found: Vec<i64> = found.into_iter().map(|i| i as i64).collect();
        prop_assert!(get_tensor_path(&tensor, &found).unwrap().is_identical(&target));
        prop_assert!(tensor_contains(&tensor, &target));
    }

    #[test]
    fn missing_target_has_no_path((_dims, tensor) in regular_tensor()) {
        let absent = Tensor::Number(1000.0);
        prop_assert_eq!(find_tensor_path(&tensor, &absent), None);
        prop_assert!(!tensor_contains(&tensor, &absent));
    }
}

#[test]
fn scenario_ragged_second_level_is_irregular() {
    let tensor: Tensor = serde_json::from_str("[[1,2],[3]]").unwrap();
    assert!(tensor_shape(&tensor).is_err());
    assert!(!tensor_valid(&tensor));
    assert_eq!(count_scalars(&tensor), 3);
}
