//! Property tests spanning the identity and directory crates.

use courier_directory::{AddressRecordValidator, SignedRecord, Validator, record_key};
use courier_identity::{Identity, NetworkId, Signature, verify};
use courier_wire::BusinessAddress;
use proptest::prelude::*;

proptest! {
    #[test]
    fn any_seed_signs_and_verifies(
        seed in any::<[u8; 32]>(),
        message in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let identity = Identity::from_seed(&seed).unwrap();
        let signature = identity.sign(&message);

        prop_assert!(verify(&identity.network_id(), &message, &signature));
    }

    #[test]
    fn tampering_breaks_verification(
        seed in any::<[u8; 32]>(),
        message in proptest::collection::vec(any::<u8>(), 1..256),
        flip_index in any::<prop::sample::Index>(),
    ) {
        let identity = Identity::from_seed(&seed).unwrap();
        let signature = identity.sign(&message);

        let mut tampered = message.clone();
        tampered[flip_index.index(message.len())] ^= 0x01;
        prop_assume!(tampered != message);

        prop_assert!(!verify(&identity.network_id(), &tampered, &signature));
    }

    #[test]
    fn verification_never_panics_on_garbage(
        id_bytes in any::<[u8; 32]>(),
        message in proptest::collection::vec(any::<u8>(), 0..64),
        sig_bytes in any::<[u8; 64]>(),
    ) {
        let id = NetworkId::from_bytes(id_bytes);
        let signature = Signature::from_bytes(sig_bytes);

        // Any outcome is acceptable; reaching this line is the property.
        let _ = verify(&id, &message, &signature);
    }

    #[test]
    fn network_id_hex_roundtrip(bytes in any::<[u8; 32]>()) {
        let id = NetworkId::from_bytes(bytes);
        let parsed: NetworkId = id.to_string().parse().unwrap();

        prop_assert_eq!(id, parsed);
    }

    #[test]
    fn sealed_records_always_verify(
        seed in any::<[u8; 32]>(),
        address in "[ -~]{1,64}",
        timestamp in any::<u64>(),
    ) {
        let identity = Identity::from_seed(&seed).unwrap();
        let record = SignedRecord::seal(
            &identity,
            BusinessAddress::from(address),
            timestamp,
        ).unwrap();

        prop_assert!(record.verify().is_ok());

        let bytes = record.to_bytes().unwrap();
        let reloaded = SignedRecord::from_bytes(&bytes).unwrap();
        prop_assert!(reloaded.verify().is_ok());
        prop_assert_eq!(reloaded, record);
    }

    #[test]
    fn select_always_picks_a_maximal_timestamp(
        seed in any::<[u8; 32]>(),
        timestamps in proptest::collection::vec(any::<u64>(), 1..8),
    ) {
        let identity = Identity::from_seed(&seed).unwrap();
        let address = BusinessAddress::from("0xprop");
        let key = record_key(&address);

        let candidates: Vec<Vec<u8>> = timestamps
            .iter()
            .map(|&timestamp| {
                SignedRecord::seal(&identity, address.clone(), timestamp)
                    .unwrap()
                    .to_bytes()
                    .unwrap()
            })
            .collect();

        let chosen = AddressRecordValidator.select(&key, &candidates).unwrap();
        let chosen_timestamp = SignedRecord::from_bytes(&candidates[chosen])
            .unwrap()
            .data
            .timestamp;

        prop_assert_eq!(chosen_timestamp, *timestamps.iter().max().unwrap());
    }
}
