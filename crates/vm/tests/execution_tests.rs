use std::sync::Arc;

use bytes::Bytes;
use ember_vm::{
    account::Account,
    db::InMemoryDatabase,
    errors::TxResult,
    precompiles::NoPrecompiles,
    Environment, VM,
};
use ethereum_types::{Address, U256};

// ==================== Helpers ====================

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn setup_vm_with_value(
    db: InMemoryDatabase,
    origin: Address,
    target: Address,
    code: Vec<u8>,
    gas_limit: u64,
    value: U256,
) -> VM {
    let env = Environment {
        origin,
        gas_limit,
        ..Default::default()
    };
    VM::new(
        env,
        Arc::new(db),
        Arc::new(NoPrecompiles),
        target,
        Bytes::from(code),
        Bytes::new(),
        value,
    )
}

fn setup_vm(db: InMemoryDatabase, target: Address, code: Vec<u8>, gas_limit: u64) -> VM {
    setup_vm_with_value(db, addr(0xAAAA), target, code, gas_limit, U256::zero())
}

/// CALL operands, pushed in reverse of the pop order.
fn call_sequence(code: &mut Vec<u8>, callee: Address, value: u8) {
    code.extend_from_slice(&[0x60, 0x00]); // ret_size
    code.extend_from_slice(&[0x60, 0x00]); // ret_offset
    code.extend_from_slice(&[0x60, 0x00]); // args_size
    code.extend_from_slice(&[0x60, 0x00]); // args_offset
    code.extend_from_slice(&[0x60, value]);
    code.push(0x73); // PUSH20
    code.extend_from_slice(callee.as_bytes());
    code.push(0x62); // PUSH3
    code.extend_from_slice(&[0x00, 0xFF, 0xFF]);
    code.push(0xF1); // CALL
}

// ==================== Halting ====================

#[test]
fn running_past_the_code_stops_cleanly() {
    let mut vm = setup_vm(InMemoryDatabase::new(), addr(0x100), Vec::new(), 100_000);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert!(report.output.is_empty());
    assert_eq!(report.gas_used, 0);
    assert_eq!(report.gas_left, 100_000);
}

#[test]
fn invalid_consumes_all_gas() {
    let mut vm = setup_vm(InMemoryDatabase::new(), addr(0x100), vec![0xFE], 100_000);
    let report = vm.execute().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.gas_used, 100_000);
    assert_eq!(report.gas_left, 0);
    assert!(report.output.is_empty());
}

#[test]
fn undispatched_opcode_takes_the_invalid_path() {
    // 0x01 (ADD) is outside the engine's table
    let mut vm = setup_vm(InMemoryDatabase::new(), addr(0x100), vec![0x01], 100_000);
    let report = vm.execute().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.gas_used, 100_000);
}

#[test]
fn out_of_gas_reverts_and_consumes_everything() {
    // two pushes cost 6; only 4 available
    let code = vec![0x60, 0x00, 0x60, 0x00];
    let mut vm = setup_vm(InMemoryDatabase::new(), addr(0x100), code, 4);
    let report = vm.execute().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.gas_used, 4);
    assert_eq!(report.gas_left, 0);
}

#[test]
fn revert_keeps_unspent_gas_and_carries_data() {
    // MSTORE 0x2A at 0, REVERT the word
    let code = vec![
        0x60, 0x2A, 0x60, 0x00, 0x52, // MSTORE
        0x60, 0x20, 0x60, 0x00, 0xFD, // REVERT 32 bytes
    ];
    let mut vm = setup_vm(InMemoryDatabase::new(), addr(0x100), code, 100_000);
    let report = vm.execute().unwrap();

    assert!(matches!(report.result, TxResult::Revert(_)));
    assert_eq!(U256::from_big_endian(&report.output), U256::from(0x2A));
    // 4 pushes + MSTORE(3+3) = 18; the rest was not consumed
    assert_eq!(report.gas_used, 18);
    assert_eq!(report.gas_left, 100_000 - 18);
}

// ==================== Root value transfer ====================

#[test]
fn call_value_moves_before_the_first_opcode() {
    let origin = addr(0xAAAA);
    let target = addr(0x100);

    let db = InMemoryDatabase::new().with_account(origin, Account::with_balance(U256::from(100)));
    let mut vm = setup_vm_with_value(db, origin, target, Vec::new(), 100_000, U256::from(40));
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(vm.state().account(origin).unwrap().balance, U256::from(60));
    assert_eq!(vm.state().account(target).unwrap().balance, U256::from(40));
}

#[test]
fn unfunded_call_value_reverts_without_running() {
    let origin = addr(0xAAAA);
    let target = addr(0x100);

    let db = InMemoryDatabase::new().with_account(origin, Account::with_balance(U256::from(10)));
    // the code would emit a log if it ran
    let code = vec![0x60, 0x00, 0x60, 0x00, 0xA0];
    let mut vm = setup_vm_with_value(db, origin, target, code, 100_000, U256::from(40));
    let report = vm.execute().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.gas_used, 0);
    assert!(report.logs.is_empty());
}

// ==================== CALLCODE ====================

#[test]
fn callcode_runs_callee_code_in_caller_storage() {
    let caller = addr(0x100);
    let library = addr(0x200);
    // library: SSTORE 1 at key 0
    let library_code = vec![0x60, 0x01, 0x60, 0x00, 0x55];

    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00]); // ret_size
    code.extend_from_slice(&[0x60, 0x00]); // ret_offset
    code.extend_from_slice(&[0x60, 0x00]); // args_size
    code.extend_from_slice(&[0x60, 0x00]); // args_offset
    code.extend_from_slice(&[0x60, 0x00]); // value
    code.push(0x73);
    code.extend_from_slice(library.as_bytes());
    code.push(0x62);
    code.extend_from_slice(&[0x00, 0xFF, 0xFF]);
    code.push(0xF2); // CALLCODE

    let db =
        InMemoryDatabase::new().with_account(library, Account::new(U256::zero(), 1, library_code.into()));
    let mut vm = setup_vm(db, caller, code, 100_000);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(
        vm.state()
            .account(caller)
            .unwrap()
            .storage
            .get(&U256::zero()),
        Some(&U256::one())
    );
    assert!(vm.state().account(library).unwrap().storage.is_empty());
}

// ==================== Block context ====================

#[test]
fn number_and_timestamp_read_the_environment() {
    let target = addr(0x100);
    let code = vec![
        0x43, 0x60, 0x00, 0x52, // NUMBER, MSTORE at 0
        0x42, 0x60, 0x20, 0x52, // TIMESTAMP, MSTORE at 32
        0x60, 0x40, 0x60, 0x00, 0xF3, // RETURN 64 bytes
    ];

    let env = Environment {
        origin: addr(0xAAAA),
        gas_limit: 100_000,
        block_number: U256::from(5),
        block_timestamp: U256::from(99),
        ..Default::default()
    };
    let mut vm = VM::new(
        env,
        Arc::new(InMemoryDatabase::new()),
        Arc::new(NoPrecompiles),
        target,
        Bytes::from(code),
        Bytes::new(),
        U256::zero(),
    );
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(U256::from_big_endian(&report.output[..32]), U256::from(5));
    assert_eq!(U256::from_big_endian(&report.output[32..]), U256::from(99));
}

// ==================== Revert atomicity across levels ====================

#[test]
fn middle_frame_revert_discards_inner_commits() {
    let root = addr(0x100);
    let middle = addr(0x200);
    let leaf = addr(0x300);

    // leaf: SSTORE 1 at key 0, succeeds
    let leaf_code = vec![0x60, 0x01, 0x60, 0x00, 0x55];
    // middle: successful call into leaf, then REVERT
    let mut middle_code = Vec::new();
    call_sequence(&mut middle_code, leaf, 0);
    middle_code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0xFD]);

    let mut code = Vec::new();
    call_sequence(&mut code, middle, 0);

    let db = InMemoryDatabase::new()
        .with_account(middle, Account::new(U256::zero(), 1, middle_code.into()))
        .with_account(leaf, Account::new(U256::zero(), 1, leaf_code.into()));
    let mut vm = setup_vm(db, root, code, 200_000);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    // the leaf's write committed into the middle frame, whose revert then
    // discarded it; the root never sees it
    assert!(vm
        .state()
        .account(leaf)
        .map_or(true, |account| account.storage.is_empty()));
}
