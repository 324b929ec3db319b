pub mod vote_generator;
