//! # End-to-End Flows
//!
//! A source chain producing batches, a relayer splitting them across relay
//! messages, and the verifier returning each message exactly once.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bmv_btpblock::{
        build_message_proof, BmvApi, BmvError, BtpMessageVerifier, SectionToRoot,
        CODE_NOT_VERIFIABLE,
    };
    use bmv_telemetry::{gather_metrics, init_test_logging};

    use crate::fixtures::{
        messages, proof_element, update_element, Link, Validators, BMC, GENESIS_HEIGHT,
    };

    // =============================================================================
    // MESSAGE EXTRACTION
    // =============================================================================

    #[test]
    fn test_update_and_full_batch_in_one_relay_message() {
        init_test_logging();
        let mut link = Link::new(4);
        let batch = messages("a", 5);
        let update = link.chain.produce(&batch);
        let proof = build_message_proof(&batch, 0, 5).unwrap();

        let delivered = link
            .submit(vec![update_element(update), proof_element(proof)])
            .unwrap();
        assert_eq!(delivered, batch);

        let state = link.state();
        assert_eq!(state.last_messages_root, None);
        assert_eq!(state.remain_message_count().unwrap(), 0);
        assert_eq!(state.height, GENESIS_HEIGHT + 1);
        assert_eq!(link.next_seq(), 5);
    }

    #[test]
    fn test_batch_extracted_across_relay_messages() {
        let mut link = Link::new(7);
        let batch = messages("b", 6);
        let update = link.chain.produce(&batch);
        assert!(link.submit(vec![update_element(update)]).unwrap().is_empty());

        let mut delivered = Vec::new();
        for (from, to) in [(0, 2), (2, 3), (3, 6)] {
            let proof = build_message_proof(&batch, from, to).unwrap();
            let out = link.submit(vec![proof_element(proof)]).unwrap();
            assert_eq!(out, batch[from..to].to_vec());
            delivered.extend(out);

            let state = link.state();
            assert_eq!(state.processed_message_count().unwrap(), to as u64);
            assert_eq!(state.last_messages_root.is_none(), to == batch.len());
        }
        assert_eq!(delivered, batch);
    }

    #[test]
    fn test_consecutive_batches_in_one_relay_message() {
        let mut link = Link::new(4);
        let first = messages("first", 3);
        let second = messages("second", 4);
        let u1 = link.chain.produce(&first);
        let u2 = link.chain.produce(&second);

        let delivered = link
            .submit(vec![
                update_element(u1),
                proof_element(build_message_proof(&first, 0, 3).unwrap()),
                update_element(u2),
                proof_element(build_message_proof(&second, 0, 4).unwrap()),
            ])
            .unwrap();

        let expected: Vec<Vec<u8>> = first.into_iter().chain(second).collect();
        assert_eq!(delivered, expected);
        assert_eq!(link.next_seq(), 7);
        assert_eq!(link.state().height, GENESIS_HEIGHT + 2);
    }

    #[test]
    fn test_section_with_sibling_networks_accepted() {
        let mut link = Link::new(4);
        let batch = messages("path", 3);
        let mut header = link.chain.next_header(&batch);
        header.network_section_to_root = vec![
            SectionToRoot::right([0x31; 32]),
            SectionToRoot::left([0x42; 32]),
        ];
        let update = link.chain.sign_quorum(header);
        link.chain.commit(&update.header);

        let delivered = link
            .submit(vec![
                update_element(update),
                proof_element(build_message_proof(&batch, 0, 3).unwrap()),
            ])
            .unwrap();
        assert_eq!(delivered, batch);

        // The next block links to the section hash, not the sections root.
        let next = link.chain.produce(&[]);
        link.submit(vec![update_element(next)]).unwrap();
        assert_eq!(link.state().height, GENESIS_HEIGHT + 2);
    }

    #[test]
    fn test_empty_blocks_advance_height_only() {
        let mut link = Link::new(4);
        for _ in 0..3 {
            let update = link.chain.produce(&[]);
            assert!(link.submit(vec![update_element(update)]).unwrap().is_empty());
        }
        assert_eq!(link.state().height, GENESIS_HEIGHT + 3);
        assert_eq!(link.next_seq(), 0);
    }

    #[test]
    fn test_open_batch_blocks_next_update() {
        let mut link = Link::new(4);
        let update = link.chain.produce(&messages("a", 2));
        link.submit(vec![update_element(update)]).unwrap();

        let next = link.chain.produce(&[]);
        assert!(matches!(
            link.submit(vec![update_element(next)]),
            Err(BmvError::LinkStateInvariantViolation(_))
        ));
    }

    #[test]
    fn test_proof_without_open_batch_rejected() {
        let mut link = Link::new(4);
        let batch = messages("a", 2);
        let proof = build_message_proof(&batch, 0, 2).unwrap();
        assert!(matches!(
            link.submit(vec![proof_element(proof)]),
            Err(BmvError::LinkStateInvariantViolation(_))
        ));
    }

    #[test]
    fn test_tampered_message_rejected() {
        let mut link = Link::new(4);
        let batch = messages("a", 4);
        let update = link.chain.produce(&batch);
        link.submit(vec![update_element(update)]).unwrap();

        let mut proof = build_message_proof(&batch, 0, 2).unwrap();
        proof.messages[1] = b"forged".to_vec();
        assert!(matches!(
            link.submit(vec![proof_element(proof)]),
            Err(BmvError::InvalidMerkleProof(_))
        ));
    }

    // =============================================================================
    // CHAIN PROGRESSION
    // =============================================================================

    #[test]
    fn test_skipped_block_not_verifiable() {
        let mut link = Link::new(4);
        let _missed = link.chain.produce(&messages("a", 2));
        let later = link.chain.produce(&[]);

        let err = link.submit(vec![update_element(later)]).unwrap_err();
        assert!(matches!(
            err,
            BmvError::NotVerifiable {
                expected: 0,
                declared: 2
            }
        ));
        assert_eq!(err.code(), CODE_NOT_VERIFIABLE);
    }

    #[test]
    fn test_validator_rotation_hands_over_signing() {
        let mut link = Link::new(4);
        let next = Validators::random(5);
        let header = link.chain.rotation_header(&[], &next);
        let update = link.chain.sign_quorum(header);
        link.chain.commit(&update.header);
        link.submit(vec![update_element(update)]).unwrap();

        let state = link.state();
        assert_eq!(state.proof_context_hash, Some(next.context_hash()));
        assert_eq!(state.proof_context.map(|pc| pc.len()), Some(5));

        // The retired set can no longer sign.
        let stale = link.chain.sign_quorum(link.chain.next_header(&[]));
        assert!(matches!(
            link.submit(vec![update_element(stale)]),
            Err(BmvError::UnknownSigner(_))
        ));

        link.chain.rotate(next);
        let update = link.chain.produce(&messages("after", 1));
        link.submit(vec![update_element(update)]).unwrap();
        assert_eq!(link.state().last_message_count, 1);
    }

    #[test]
    fn test_rotation_to_current_set_rejected() {
        let mut link = Link::new(4);
        let same = link.chain.validators().encoded_context();
        let mut header = link.chain.next_header(&[]);
        header.update_number |= 1;
        header.next_proof_context = Some(same);
        let update = link.chain.sign_quorum(header);
        assert_eq!(
            link.submit(vec![update_element(update)]),
            Err(BmvError::MismatchUpdateFlag)
        );
    }

    // =============================================================================
    // SEQUENCE OFFSET, STATUS, PERSISTENCE
    // =============================================================================

    #[test]
    fn test_sequence_offset_shifts_router_numbering() {
        let mut link = Link::with_offset(4, 1000);
        assert_eq!(link.next_seq(), 1000);

        let batch = messages("o", 3);
        let update = link.chain.produce(&batch);
        let proof = build_message_proof(&batch, 0, 3).unwrap();
        link.submit_at(1000, vec![update_element(update), proof_element(proof)])
            .unwrap();

        assert_eq!(link.next_seq(), 1003);
        let extra = link.verifier.get_status().unwrap().decode_extra().unwrap();
        assert_eq!(extra.sequence_offset, 1000);
        assert_eq!(extra.last_first_message_sn, 1000);
        assert_eq!(extra.last_message_count, 3);
    }

    #[test]
    fn test_reopened_verifier_continues() {
        let mut link = Link::new(4);
        let batch = messages("r", 4);
        let update = link.chain.produce(&batch);
        link.submit(vec![
            update_element(update),
            proof_element(build_message_proof(&batch, 0, 1).unwrap()),
        ])
        .unwrap();

        let mut reopened = BtpMessageVerifier::open(Arc::clone(&link.store)).unwrap();
        assert_eq!(reopened.link_state().unwrap(), link.state());

        let proof = build_message_proof(&batch, 1, 4).unwrap();
        let out = reopened
            .handle_relay_message(
                BMC,
                &Link::bmc_address(),
                &Link::prev_address(),
                1,
                &crate::fixtures::relay(vec![proof_element(proof)]),
            )
            .unwrap();
        assert_eq!(out, batch[1..].to_vec());
    }

    #[test]
    fn test_wrong_caller_denied() {
        let mut link = Link::new(4);
        let update = link.chain.produce(&[]);
        let err = link
            .verifier
            .handle_relay_message(
                "cx00000000000000000000000000000000000000ff",
                &Link::bmc_address(),
                &Link::prev_address(),
                0,
                &crate::fixtures::relay(vec![update_element(update)]),
            )
            .unwrap_err();
        assert!(matches!(err, BmvError::AccessDenied(_)));
    }

    #[test]
    fn test_metrics_exposed() {
        let mut link = Link::new(4);
        let update = link.chain.produce(&[]);
        link.submit(vec![update_element(update)]).unwrap();

        let text = gather_metrics().unwrap();
        assert!(text.contains("bmv_relay_messages_total"));
        assert!(text.contains("bmv_block_updates_verified_total"));
    }
}
