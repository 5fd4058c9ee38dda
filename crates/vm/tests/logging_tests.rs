use std::sync::Arc;

use bytes::Bytes;
use ember_vm::{
    account::Account, db::InMemoryDatabase, precompiles::NoPrecompiles, Environment, VM,
};
use ethereum_types::{Address, H256, U256};

// ==================== Helpers ====================

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn setup_vm(db: InMemoryDatabase, target: Address, code: Vec<u8>) -> VM {
    let env = Environment {
        origin: addr(0xAAAA),
        gas_limit: 200_000,
        ..Default::default()
    };
    VM::new(
        env,
        Arc::new(db),
        Arc::new(NoPrecompiles),
        target,
        Bytes::from(code),
        Bytes::new(),
        U256::zero(),
    )
}

/// LOG1 of memory[0..32] (holding 0x41) with the topic 7.
fn log1_bytecode() -> Vec<u8> {
    vec![
        0x60, 0x41, 0x60, 0x00, 0x52, // MSTORE 0x41 at 0
        0x60, 0x07, // topic
        0x60, 0x20, // size
        0x60, 0x00, // offset
        0xA1, // LOG1
    ]
}

// ==================== LOG ====================

#[test]
fn log1_emits_topic_and_data() {
    let contract = addr(0x100);
    let mut vm = setup_vm(InMemoryDatabase::new(), contract, log1_bytecode());
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(report.logs.len(), 1);

    let log = &report.logs[0];
    assert_eq!(log.address, contract);
    assert_eq!(log.topics, vec![H256::from_low_u64_be(7)]);
    assert_eq!(U256::from_big_endian(&log.data), U256::from(0x41));
}

#[test]
fn log0_emits_no_topics() {
    let contract = addr(0x100);
    let code = vec![
        0x60, 0x00, // size 0
        0x60, 0x00, // offset 0
        0xA0, // LOG0
    ];
    let mut vm = setup_vm(InMemoryDatabase::new(), contract, code);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(report.logs.len(), 1);
    assert!(report.logs[0].topics.is_empty());
    assert!(report.logs[0].data.is_empty());
}

#[test]
fn log_in_read_only_context_reverts() {
    let caller = addr(0x100);
    let contract = addr(0x200);

    // root: STATICCALL into the logger and return the flag
    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00]); // ret_size
    code.extend_from_slice(&[0x60, 0x00]); // ret_offset
    code.extend_from_slice(&[0x60, 0x00]); // args_size
    code.extend_from_slice(&[0x60, 0x00]); // args_offset
    code.push(0x73); // PUSH20
    code.extend_from_slice(contract.as_bytes());
    code.push(0x62); // PUSH3
    code.extend_from_slice(&[0x00, 0xFF, 0xFF]);
    code.push(0xFA); // STATICCALL
    code.extend_from_slice(&[0x60, 0x00, 0x52]); // MSTORE flag
    code.extend_from_slice(&[0x60, 0x20, 0x60, 0x00, 0xF3]); // RETURN

    let db =
        InMemoryDatabase::new().with_account(contract, Account::new(U256::zero(), 1, log1_bytecode().into()));
    let mut vm = setup_vm(db, caller, code);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(U256::from_big_endian(&report.output), U256::zero());
    assert!(report.logs.is_empty());
}

#[test]
fn logs_of_reverted_children_are_discarded() {
    let caller = addr(0x100);
    let contract = addr(0x200);
    // logger that reverts after emitting
    let mut contract_code = log1_bytecode();
    contract_code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0xFD]); // REVERT

    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00]); // ret_size
    code.extend_from_slice(&[0x60, 0x00]); // ret_offset
    code.extend_from_slice(&[0x60, 0x00]); // args_size
    code.extend_from_slice(&[0x60, 0x00]); // args_offset
    code.extend_from_slice(&[0x60, 0x00]); // value
    code.push(0x73);
    code.extend_from_slice(contract.as_bytes());
    code.push(0x62);
    code.extend_from_slice(&[0x00, 0xFF, 0xFF]);
    code.push(0xF1); // CALL

    let db =
        InMemoryDatabase::new().with_account(contract, Account::new(U256::zero(), 1, contract_code.into()));
    let mut vm = setup_vm(db, caller, code);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert!(report.logs.is_empty());
}

#[test]
fn logs_of_successful_children_commit_upward() {
    let caller = addr(0x100);
    let contract = addr(0x200);

    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00]); // ret_size
    code.extend_from_slice(&[0x60, 0x00]); // ret_offset
    code.extend_from_slice(&[0x60, 0x00]); // args_size
    code.extend_from_slice(&[0x60, 0x00]); // args_offset
    code.extend_from_slice(&[0x60, 0x00]); // value
    code.push(0x73);
    code.extend_from_slice(contract.as_bytes());
    code.push(0x62);
    code.extend_from_slice(&[0x00, 0xFF, 0xFF]);
    code.push(0xF1); // CALL

    let db =
        InMemoryDatabase::new().with_account(contract, Account::new(U256::zero(), 1, log1_bytecode().into()));
    let mut vm = setup_vm(db, caller, code);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    assert_eq!(report.logs.len(), 1);
    assert_eq!(report.logs[0].address, contract);
}
