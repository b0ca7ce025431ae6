use state_machines::state_machine;

state_machine! {
    name: IndexingMachine,
    state: IndexingState,
    initial: Ready,
    states: [Ready, Chunked, Embedded, Published, Failed],
    events {
        chunk { transition: { from: Ready, to: Chunked } }
        embed { transition: { from: Chunked, to: Embedded } }
        publish { transition: { from: Embedded, to: Published } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Chunked, to: Failed }
            transition: { from: Embedded, to: Failed }
            transition: { from: Published, to: Failed }
        }
    }
}

pub fn ready() -> IndexingMachine<(), Ready> {
    IndexingMachine::new(())
}
