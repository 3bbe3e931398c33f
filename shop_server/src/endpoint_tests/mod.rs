mod flow;
mod helpers;
mod mocks;
mod payments;
mod transfers;
