mod alerts;
mod basic;
mod directory;
