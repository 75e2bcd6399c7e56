//! Property tests over whole programs

use lusp_language::{Environment, Value, Vm, eval, eval_in};
use proptest::prelude::*;

proptest! {
    #[test]
    fn counter_counts_from_its_seed(seed in -1_000_000i64..1_000_000, calls in 1usize..20) {
        let mut env = Environment::new();
        let mut vm = Vm::new();
        let source = format!("make = |n| {{ let x = n |() x = x + 1 x| }} c = make({seed})");
        eval_in(&mut env, &mut vm, &source).unwrap();
        let counter = env.get("c");
        let mut last = Value::Null;
        for _ in 0..calls {
            last = vm.call(&env, &counter, &[]).unwrap();
        }
        prop_assert_eq!(last, Value::Integer(seed + calls as i64));
        prop_assert_eq!(vm.open_upvalue_count(), 0);
    }

    #[test]
    fn while_sum_matches_host(limit in 0i64..200) {
        let source = format!("let i = 0 let sum = 0 while i < {limit} {{ i = i + 1 sum = sum + i }} sum");
        prop_assert_eq!(eval(&source).unwrap(), Value::Integer(limit * (limit + 1) / 2));
    }
}
