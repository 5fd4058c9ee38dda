use ember_vm::memory::{calculate_memory_size, expansion_cost, Memory};
use ethereum_types::U256;

#[test]
fn store_then_load_roundtrips() {
    let mut mem = Memory::new();

    mem.store_data(4, &[1, 2, 3, 4]).unwrap();

    assert_eq!(&mem.load_range(4, 4).unwrap()[..], &[1, 2, 3, 4]);
    assert_eq!(mem.len(), 32);
}

#[test]
fn words_roundtrip() {
    let mut mem = Memory::new();

    mem.store_word(0, U256::from(4)).unwrap();

    assert_eq!(mem.load_word(0).unwrap(), U256::from(4));
    assert_eq!(mem.len(), 32);
}

#[test]
fn load_beyond_length_zero_fills() {
    let mut mem = Memory::new();

    mem.store_data(0, &[0xff]).unwrap();
    let loaded = mem.load_range(0, 40).unwrap();

    assert_eq!(loaded[0], 0xff);
    assert!(loaded[1..].iter().all(|byte| *byte == 0));
    // the read itself grew memory to the next word boundary
    assert_eq!(mem.len(), 64);
}

#[test]
fn zero_sized_access_never_grows() {
    let mut mem = Memory::new();

    assert!(mem.load_range(1_000_000, 0).unwrap().is_empty());
    assert_eq!(mem.len(), 0);
    assert_eq!(calculate_memory_size(1_000_000, 0).unwrap(), 0);
}

#[test]
fn growth_is_word_granular() {
    let mut mem = Memory::new();

    mem.store_data(33, &[7]).unwrap();
    assert_eq!(mem.len(), 64);
}

#[test]
fn memory_size_rounds_up_to_words() {
    assert_eq!(calculate_memory_size(0, 1).unwrap(), 32);
    assert_eq!(calculate_memory_size(31, 1).unwrap(), 32);
    assert_eq!(calculate_memory_size(32, 1).unwrap(), 64);
    assert_eq!(calculate_memory_size(0, 33).unwrap(), 64);
}

#[test]
fn expansion_cost_is_quadratic_delta() {
    // 3·w + w²/512, charged as a delta
    assert_eq!(expansion_cost(32, 0).unwrap(), 3);
    assert_eq!(expansion_cost(64, 32).unwrap(), 3);
    assert_eq!(expansion_cost(1024, 0).unwrap(), 3 * 32 + 2);
    // no growth, no charge
    assert_eq!(expansion_cost(32, 32).unwrap(), 0);
    assert_eq!(expansion_cost(16, 64).unwrap(), 0);
}

#[test]
fn large_expansion_matches_formula() {
    // 1 MiB = 32768 words: 3·32768 + 32768²/512
    let words: u64 = 32768;
    assert_eq!(
        expansion_cost(1024 * 1024, 0).unwrap(),
        3 * words + words * words / 512
    );
}
