mod attachment;
mod path_constraint;
mod path_sampler;
mod skeleton;

pub use attachment::*;
pub use path_constraint::*;
pub use path_sampler::*;
pub use skeleton::*;

#[cfg(test)]
mod test_rigs;



#[cfg(test)]
mod path_sampler_tests;
