mod commit;
mod update;
