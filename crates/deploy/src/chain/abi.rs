//! Solidity interfaces the deployer talks to.

use alloy_core::sol;

sol! {
    /// The parts of Chainlink's `VRFCoordinatorV2Mock` used to provision a local subscription.
    interface VRFCoordinatorV2Mock {
        event SubscriptionCreated(uint64 indexed subId, address owner);
        event ConsumerAdded(uint64 indexed subId, address consumer);

        function createSubscription() external returns (uint64 subId);
        function fundSubscription(uint64 subId, uint96 amount) external;
    }

    /// Constructor of the deployed lottery contract.
    contract Raffle {
        constructor(
            address vrfCoordinatorV2,
            uint64 subscriptionId,
            uint256 entranceFee,
            bytes32 gasLane,
            uint32 callbackGasLimit,
            uint256 interval
        );
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::{
        primitives::{Address, B256, U256, address, aliases::U96, b256},
        sol_types::{SolCall, SolConstructor, SolEvent},
    };

    use super::*;

    #[test]
    fn test_coordinator_selectors() {
        assert_eq!(
            hex::encode(VRFCoordinatorV2Mock::createSubscriptionCall::SELECTOR),
            "a21a23e4"
        );
        assert_eq!(
            VRFCoordinatorV2Mock::fundSubscriptionCall::SIGNATURE,
            "fundSubscription(uint64,uint96)"
        );
    }

    #[test]
    fn test_subscription_created_round_trips_through_log_data() {
        let event = VRFCoordinatorV2Mock::SubscriptionCreated {
            subId: 7,
            owner: address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
        };
        let log = event.encode_log_data();

        assert_eq!(
            log.topics()[0],
            VRFCoordinatorV2Mock::SubscriptionCreated::SIGNATURE_HASH
        );
        assert_eq!(log.topics()[1], B256::from(U256::from(7u64).to_be_bytes::<32>()));

        let decoded = VRFCoordinatorV2Mock::SubscriptionCreated::decode_raw_log(
            log.topics().iter().copied(),
            &log.data,
        )
        .unwrap();
        assert_eq!(decoded.subId, 7);
    }

    #[test]
    fn test_fund_subscription_calldata() {
        let call = VRFCoordinatorV2Mock::fundSubscriptionCall {
            subId: 1,
            amount: U96::from(1_000_000_000_000_000_000u64),
        };
        let calldata = hex::encode(call.abi_encode());

        assert_eq!(calldata.len(), 2 * (4 + 2 * 32));
        assert_eq!(
            &calldata[8..72],
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(
            &calldata[72..136],
            "0000000000000000000000000000000000000000000000000de0b6b3a7640000"
        );
    }

    #[test]
    fn test_raffle_constructor_words() {
        let lane = b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc");
        let constructor = Raffle::constructorCall {
            vrfCoordinatorV2: Address::repeat_byte(0x11),
            subscriptionId: 42,
            entranceFee: U256::from(10u64),
            gasLane: lane,
            callbackGasLimit: 500_000,
            interval: U256::from(30u64),
        };
        let encoded = constructor.abi_encode();

        assert_eq!(encoded.len(), 6 * 32);
        assert_eq!(&encoded[96..128], lane.as_slice());
        assert_eq!(encoded[63], 42);
    }
}
