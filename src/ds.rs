mod repr_states;

pub use repr_states::RepresentativeStates;
