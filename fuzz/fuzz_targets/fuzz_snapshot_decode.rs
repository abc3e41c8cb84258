#![no_main]

use libfuzzer_sys::fuzz_target;

use tally_election::{Election, ElectionSnapshot};

// Decoding arbitrary bytes must never panic, and anything that decodes must
// restore into an election whose counts match its voters.
fuzz_target!(|data: &[u8]| {
    if let Ok(snapshot) = ElectionSnapshot::decode(data) {
        let election = Election::restore(snapshot).expect("decoded snapshots are valid");
        assert_eq!(election.total_votes(), election.voter_count() as u64);
    }
});
