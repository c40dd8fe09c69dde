pub(crate) mod assets;
pub(crate) mod audio;
pub(crate) mod bootstrap;
pub(crate) mod editor;
pub(crate) mod gameplay;
pub(crate) mod loop_runner;
