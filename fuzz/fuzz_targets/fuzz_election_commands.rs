#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tally_election::Election;
use tally_types::Identity;

#[derive(Arbitrary, Debug)]
enum Op {
    Vote { voter: u8, index: u8 },
    End { caller: u8 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    candidates: u8,
    ops: Vec<Op>,
}

// Apply arbitrary command sequences and check the ledger invariants after
// every step: counts equal voters, voted stays voted, closed stays closed.
fuzz_target!(|input: Input| {
    let count = usize::from(input.candidates % 8) + 1;
    let names: Vec<String> = (0..count).map(|i| format!("c{i}")).collect();
    let owner = Identity::new("id-0");
    let mut election = Election::new(owner, names).unwrap();

    for op in input.ops {
        let was_open = election.voting_open();
        match op {
            Op::Vote { voter, index } => {
                let id = Identity::new(format!("id-{voter}"));
                let had_voted = election.has_voted(&id);
                let result = election.vote(&id, usize::from(index));
                assert!(!(had_voted && result.is_ok()));
                assert_eq!(election.has_voted(&id), had_voted || result.is_ok());
            }
            Op::End { caller } => {
                let result = election.end_voting(&Identity::new(format!("id-{caller}")));
                assert!(!(result.is_ok() && !was_open));
            }
        }
        assert!(was_open || !election.voting_open());
        assert_eq!(election.total_votes(), election.voter_count() as u64);
        assert_eq!(election.candidate_count(), count);
    }
});
